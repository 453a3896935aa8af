//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any response as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format probability as percentage
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Color the predicted label
pub fn color_label(label: &str) -> String {
    match label {
        "Failure" => label.red().bold().to_string(),
        "No Failure" => label.green().bold().to_string(),
        _ => label.to_string(),
    }
}

/// Color a signed contribution: positive pushes toward failure
pub fn color_contribution(value: f64) -> String {
    let formatted = format!("{:+.4}", value);
    if value > 0.0 {
        formatted.red().to_string()
    } else if value < 0.0 {
        formatted.green().to_string()
    } else {
        formatted
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_probability() {
        assert_eq!(format_probability(0.5), "50.0%");
        assert_eq!(format_probability(0.1234), "12.3%");
    }

    #[test]
    fn test_contribution_keeps_sign() {
        colored::control::set_override(false);
        assert_eq!(color_contribution(0.25), "+0.2500");
        assert_eq!(color_contribution(-1.0), "-1.0000");
        assert_eq!(color_contribution(0.0), "+0.0000");
    }
}
