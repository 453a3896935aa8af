//! Prediction CLI command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, Prediction};
use crate::output::{color_contribution, color_label, format_probability, print_json, OutputFormat};

/// Row for the attribution table
#[derive(Tabled)]
struct AttributionRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "SHAP Value")]
    value: String,
}

/// Attributions ordered by absolute contribution, largest first
fn ranked_attributions(prediction: &Prediction) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = prediction
        .attributions
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Request a prediction for seven feature values
pub async fn predict(client: &ApiClient, values: &[String], format: OutputFormat) -> Result<()> {
    let prediction = client.predict(values).await?;

    match format {
        OutputFormat::Json => print_json(&prediction)?,
        OutputFormat::Table => {
            println!("{}", "Machine Failure Prediction".bold());
            println!("{}", "=".repeat(50));
            println!("Prediction:          {}", color_label(&prediction.label));
            println!(
                "Failure Probability: {} ({})",
                format_probability(prediction.probability),
                prediction.probability
            );
            if let Some(base) = prediction.base_value {
                println!("Base value:          {}", base);
            }
            println!();

            let rows: Vec<AttributionRow> = ranked_attributions(&prediction)
                .into_iter()
                .map(|(feature, value)| AttributionRow {
                    feature: feature.to_string(),
                    value: color_contribution(value),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_attributions_ranked_by_magnitude() {
        let attributions = BTreeMap::from([
            ("a".to_string(), 0.1),
            ("b".to_string(), -0.9),
            ("c".to_string(), 0.5),
        ]);
        let prediction = Prediction {
            label: "No Failure".to_string(),
            probability: 0.3,
            attributions,
            base_value: None,
        };

        let names: Vec<&str> = ranked_attributions(&prediction)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }
}
