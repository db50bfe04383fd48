//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "census.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Census configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set source.kind to 'filesystem' or 'http'");
                println!("  3. For the HTTP source, put CENSUS_API_TOKEN in a .env file");
                println!("  4. Validate configuration: census validate-config");
                println!("  5. Run export: census export --school <id> --year <year> --term <term>");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Census Configuration File
# School compliance data export

[application]
log_level = "info"

[fetch]
timeout_ms = 10000
max_retries = 2
retry_backoff_ms = 500

[job]
overall_timeout_secs = 300

[source]
kind = "filesystem"
data_dir = "./data"

[history]
path = "./census-history.jsonl"

[output]
directory = "./exports"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Census Configuration File
# School compliance data export
#
# Values of the form ${VAR} are replaced with environment variables when the
# file is loaded. Any key can also be overridden with CENSUS_<SECTION>_<KEY>,
# for example CENSUS_FETCH_MAX_RETRIES=4.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Source Fetching
# ============================================================================
[fetch]
# Timeout for a single request to one record source, in milliseconds
timeout_ms = 10000

# Additional attempts after the first failure (0-10)
max_retries = 2

# Fixed delay between attempts, in milliseconds
retry_backoff_ms = 500

# ============================================================================
# Export Jobs
# ============================================================================
[job]
# Limit on fetching and aggregating one export, in seconds
overall_timeout_secs = 300

# ============================================================================
# Grading
# ============================================================================
# List bands from the highest threshold down; a percentage at or above
# min_percentage gets that letter. Anything below the lowest band gets the
# fallback letter.
[grading]
fallback = "F"

[[grading.bands]]
min_percentage = 80.0
letter = "A"

[[grading.bands]]
min_percentage = 60.0
letter = "B"

[[grading.bands]]
min_percentage = 50.0
letter = "C"

[[grading.bands]]
min_percentage = 40.0
letter = "D"

# ============================================================================
# Record Source
# Choose ONE backend with source.kind
# ============================================================================
[source]
# filesystem | http
kind = "filesystem"

# Filesystem layout:
#   <data_dir>/<school_id>/profile.json
#   <data_dir>/<school_id>/students.json, staff.json, classes.json, subjects.json
#   <data_dir>/<school_id>/attendance/<academic_year>_<term>.json
#   <data_dir>/<school_id>/assessments/<academic_year>_<term>.json
data_dir = "./data"

# Uncomment to read from the school records API instead (kind = "http")
#
# [source.http]
# base_url = "https://records.example.org/api/v1"
# api_token = "${CENSUS_API_TOKEN}"
# timeout_seconds = 30

# ============================================================================
# Export History
# ============================================================================
[history]
# JSON-lines file; one entry is appended per finished export
path = "./census-history.jsonl"

# ============================================================================
# Output
# ============================================================================
[output]
# Directory the export command writes artifacts to
directory = "./exports"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "census.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "census.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generate_minimal_config_is_loadable() {
        let config = parse_config(&InitArgs::generate_minimal_config()).unwrap();
        assert_eq!(config.fetch.max_retries, 2);
        assert_eq!(config.source.data_dir.as_deref(), Some("./data"));
    }

    #[test]
    fn test_generate_config_with_examples_is_loadable() {
        let text = InitArgs::generate_config_with_examples();
        assert!(text.contains("# Census Configuration File"));

        let config = parse_config(&text).unwrap();
        assert_eq!(config.grading.bands.len(), 4);
        assert_eq!(config.grading.fallback, "F");
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("census.toml");
        fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");
    }
}
