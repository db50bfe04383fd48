//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Census configuration file.

use crate::config::load_config;
use crate::config::schema::SourceKindConfig;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Fetch: timeout {}ms, {} retries, {}ms backoff",
            config.fetch.timeout_ms, config.fetch.max_retries, config.fetch.retry_backoff_ms
        );
        println!("  Job Timeout: {}s", config.job.overall_timeout_secs);

        let bands = config
            .grading
            .bands
            .iter()
            .map(|b| format!("{}>={}", b.letter, b.min_percentage))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  Grading: {bands}, else {}", config.grading.fallback);

        match config.source.kind {
            SourceKindConfig::Filesystem => {
                println!("  Source: filesystem");
                if let Some(dir) = &config.source.data_dir {
                    println!("  Data Directory: {dir}");
                }
            }
            SourceKindConfig::Http => {
                println!("  Source: http");
                if let Some(http) = &config.source.http {
                    println!("  Base URL: {}", http.base_url);
                    println!(
                        "  API Token: {}",
                        if http.api_token.is_some() { "set" } else { "not set" }
                    );
                }
            }
        }

        println!("  History: {}", config.history.path);
        println!("  Output Directory: {}", config.output.directory);
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_config_exits_zero() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[source]\nkind = \"filesystem\"\ndata_dir = \"./data\"").unwrap();

        let code = ValidateArgs {}
            .execute(&file.path().to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_exits_two() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[fetch]\nmax_retries = 50\n[source]\nkind = \"filesystem\"\ndata_dir = \"d\"").unwrap();

        let code = ValidateArgs {}
            .execute(&file.path().to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
