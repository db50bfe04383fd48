//! Configuration schema types
//!
//! This module defines the structure of `census.toml`.

use crate::config::SecretString;
use crate::core::aggregate::grading::{default_bands, GradeBand, GradingScale};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record source backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKindConfig {
    /// JSON files under a data directory
    Filesystem,
    /// School administration REST API
    Http,
}

/// Main Census configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensusConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Per-source fetch policy
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Job-level limits
    #[serde(default)]
    pub job: JobConfig,

    /// Letter-grade banding for assessments
    #[serde(default)]
    pub grading: GradingConfig,

    /// Where records and compliance profiles are read from
    pub source: SourceConfig,

    /// Export history log
    #[serde(default)]
    pub history: HistoryConfig,

    /// Artifact output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CensusConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.fetch.validate()?;
        self.job.validate()?;
        self.grading.validate()?;
        self.source.validate()?;
        self.history.validate()?;
        self.output.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Fetch policy applied to each of the six record sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for a single attempt against one source, in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,

    /// Additional attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("fetch.timeout_ms must be > 0".to_string());
        }
        if self.max_retries > 10 {
            return Err(format!(
                "fetch.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Job-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Upper bound on the running stages of one export job, in seconds
    #[serde(default = "default_overall_timeout_secs")]
    pub overall_timeout_secs: u64,
}

impl JobConfig {
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }

    fn validate(&self) -> Result<(), String> {
        if self.overall_timeout_secs == 0 {
            return Err("job.overall_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            overall_timeout_secs: default_overall_timeout_secs(),
        }
    }
}

/// Grading configuration
///
/// ```toml
/// [grading]
/// fallback = "F"
/// bands = [
///     { min_percentage = 80.0, letter = "A" },
///     { min_percentage = 60.0, letter = "B" },
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    #[serde(default = "default_bands")]
    pub bands: Vec<GradeBand>,

    /// Letter for percentages below every band
    #[serde(default = "default_fallback_grade")]
    pub fallback: String,
}

impl GradingConfig {
    /// Build the grading scale described by this section
    ///
    /// # Errors
    ///
    /// Returns an error if the bands are not a valid scale
    pub fn scale(&self) -> Result<GradingScale, String> {
        GradingScale::new(self.bands.clone(), self.fallback.clone())
            .map_err(|e| format!("Invalid grading scale: {e}"))
    }

    fn validate(&self) -> Result<(), String> {
        self.scale().map(|_| ())
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            fallback: default_fallback_grade(),
        }
    }
}

/// Record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Backend kind (filesystem or http)
    pub kind: SourceKindConfig,

    /// Data directory (required if kind = filesystem)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// REST API settings (required if kind = http)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSourceConfig>,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        // Both backends may be configured side by side; only the active one is checked
        match self.kind {
            SourceKindConfig::Filesystem => match &self.data_dir {
                Some(dir) if !dir.trim().is_empty() => Ok(()),
                _ => Err("source.data_dir is required when source.kind = 'filesystem'".to_string()),
            },
            SourceKindConfig::Http => match &self.http {
                Some(http) => http.validate(),
                None => Err("source.http is required when source.kind = 'http'".to_string()),
            },
        }
    }
}

/// School administration REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Base URL of the API, e.g. `https://records.example.org/api/v1`
    pub base_url: String,

    /// Bearer token sent with every request
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_token: Option<SecretString>,

    /// Transport-level request timeout in seconds
    #[serde(default = "default_http_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl HttpSourceConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("source.http.base_url cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("source.http.base_url must start with http:// or https://".to_string());
        }
        if let Some(token) = &self.api_token {
            if token.expose_secret().is_empty() {
                return Err("source.http.api_token cannot be empty when set".to_string());
            }
        }
        if self.timeout_seconds == 0 {
            return Err("source.http.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// Export history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// JSON-lines file receiving one entry per finished job
    #[serde(default = "default_history_path")]
    pub path: String,
}

impl HistoryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("history.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

/// Artifact output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the CLI writes artifacts into
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.directory.trim().is_empty() {
            return Err("output.directory cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_overall_timeout_secs() -> u64 {
    300
}

fn default_fallback_grade() -> String {
    "F".to_string()
}

fn default_http_timeout_seconds() -> u64 {
    30
}

fn default_history_path() -> String {
    "./census-history.jsonl".to_string()
}

fn default_output_directory() -> String {
    "./exports".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn minimal() -> CensusConfig {
        toml::from_str(
            r#"
[source]
kind = "filesystem"
data_dir = "./data"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = minimal();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.fetch.timeout_ms, 10_000);
        assert_eq!(config.fetch.max_retries, 2);
        assert_eq!(config.fetch.retry_backoff(), Duration::from_millis(500));
        assert_eq!(config.job.overall_timeout(), Duration::from_secs(300));
        assert_eq!(config.grading.bands.len(), 4);
        assert_eq!(config.grading.fallback, "F");
        assert!(!config.logging.local_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = minimal();
        config.application.log_level = "loud".to_string();
        assert!(config.validate().unwrap_err().contains("log_level"));
    }

    #[test]
    fn test_max_retries_bound() {
        let mut config = minimal();
        config.fetch.max_retries = 11;
        assert!(config.validate().is_err());
        config.fetch.max_retries = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_filesystem_requires_data_dir() {
        let mut config = minimal();
        config.source.data_dir = None;
        assert!(config.validate().unwrap_err().contains("data_dir"));
    }

    #[test]
    fn test_http_source_validation() {
        let mut config = minimal();
        config.source.kind = SourceKindConfig::Http;
        assert!(config.validate().is_err());

        config.source.http = Some(HttpSourceConfig {
            base_url: "ftp://records".to_string(),
            api_token: None,
            timeout_seconds: 30,
        });
        assert!(config.validate().is_err());

        config.source.http = Some(HttpSourceConfig {
            base_url: "https://records.example.org".to_string(),
            api_token: Some(secret_string(String::new())),
            timeout_seconds: 30,
        });
        assert!(config.validate().unwrap_err().contains("api_token"));

        config.source.http = Some(HttpSourceConfig {
            base_url: "https://records.example.org".to_string(),
            api_token: Some(secret_string("token".to_string())),
            timeout_seconds: 30,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grading_section_parsed_and_validated() {
        let config: CensusConfig = toml::from_str(
            r#"
[source]
kind = "filesystem"
data_dir = "./data"

[grading]
fallback = "U"
bands = [
    { min_percentage = 70.0, letter = "Distinction" },
    { min_percentage = 50.0, letter = "Pass" },
]
"#,
        )
        .unwrap();
        let scale = config.grading.scale().unwrap();
        assert_eq!(scale.letter_for(71.0), "Distinction");
        assert_eq!(scale.letter_for(10.0), "U");

        let mut broken = config.clone();
        broken.grading.bands.push(GradeBand::new(150.0, "X"));
        assert!(broken.validate().unwrap_err().contains("grading"));

        let mut unordered = config.clone();
        unordered.grading.bands.push(GradeBand::new(90.0, "Star"));
        assert!(unordered.validate().unwrap_err().contains("higher threshold"));
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = minimal();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }
}
