//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Census using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Census - School compliance data export
#[derive(Parser, Debug)]
#[command(name = "census")]
#[command(version, about, long_about = None)]
#[command(author = "Census Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "census.toml", env = "CENSUS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CENSUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a school's compliance data for one period
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show recorded export history
    History(commands::history::HistoryArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from([
            "census", "export", "--school", "s-001", "--year", "2024", "--term", "T1",
        ]);
        assert_eq!(cli.config, "census.toml");
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.school, "s-001");
                assert_eq!(args.year, "2024");
                assert_eq!(args.term, "T1");
                assert!(!args.yes);
            }
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_export_requires_school() {
        let result = Cli::try_parse_from(["census", "export", "--year", "2024", "--term", "T1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["census", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["census", "--log-level", "debug", "history"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_history_filter() {
        let cli = Cli::parse_from(["census", "history", "--school", "s-009"]);
        match cli.command {
            Commands::History(args) => assert_eq!(args.school.as_deref(), Some("s-009")),
            other => panic!("expected history, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["census", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init(ref a) if a.force));
    }
}
