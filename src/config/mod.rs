//! Configuration management for Census.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Census uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CENSUS_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use census::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("census.toml")?;
//! println!("Per-source timeout: {}ms", config.fetch.timeout_ms);
//! println!("History log: {}", config.history.path);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`FetchConfig`] - Per-source timeout, retries and backoff
//! - [`JobConfig`] - Overall job timeout
//! - [`GradingConfig`] - Letter-grade bands
//! - [`SourceConfig`] - Filesystem or HTTP record source
//! - [`HistoryConfig`] - Export history log location
//! - [`OutputConfig`] - Artifact output directory
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [fetch]
//! timeout_ms = 10000
//! max_retries = 2
//! retry_backoff_ms = 500
//!
//! [source]
//! kind = "http"
//!
//! [source.http]
//! base_url = "https://records.example.org/api/v1"
//! api_token = "${CENSUS_API_TOKEN}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, CensusConfig, FetchConfig, GradingConfig, HistoryConfig, HttpSourceConfig,
    JobConfig, LoggingConfig, OutputConfig, SourceConfig, SourceKindConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
