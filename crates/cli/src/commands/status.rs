//! Service info and health CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_info, print_json, print_warning, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show the form title, feature order and decision threshold
pub async fn show_info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.info().await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{}", info.title.bold());
            println!("{}", info.description);
            println!();
            println!("Decision threshold: probability > {}", info.threshold);
            println!(
                "Backends: classifier={} explainer={}",
                info.classifier_backend.cyan(),
                info.attributor_backend.cyan()
            );
            println!();
            println!("Features (in input order):");
            for (i, feature) in info.features.iter().enumerate() {
                println!("  {}. {}", i + 1, feature);
            }
        }
    }

    Ok(())
}

/// Show overall and per-component health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("Service status: {}", color_status(&health.status));

            if health.components.is_empty() {
                print_warning("No components registered");
                return Ok(());
            }

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&component.status),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            if health.status != "healthy" {
                print_info("Degraded components recover after the next successful prediction");
            }
        }
    }

    Ok(())
}
