//! Machine Failure Predictor CLI
//!
//! A command-line client for requesting predictions and inspecting the
//! failure prediction service.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{predict, status};

/// Machine Failure Predictor CLI
#[derive(Parser)]
#[command(name = "fpctl")]
#[command(author, version, about = "CLI for the Machine Failure Predictor", long_about = None)]
pub struct Cli {
    /// Service URL (can also be set via FP_API_URL env var)
    #[arg(long, env = "FP_API_URL", default_value = "http://localhost:7860")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict failure for seven feature values given in model order
    Predict {
        /// rotational_speed_scaled torque_scaled tool_wear_minutes
        /// torque_x_rotspeed_scaled torque_x_toolwear_scaled
        /// rotspeed_x_toolwear_scaled torque_x_rotspeed_x_toolwear_scaled
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        values: Vec<String>,
    },

    /// Show the feature order, threshold and loaded backends
    Info,

    /// Show service health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Predict { values } => {
            predict::predict(&client, &values, cli.format).await?;
        }
        Commands::Info => {
            status::show_info(&client, cli.format).await?;
        }
        Commands::Health => {
            status::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
