//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{CensusConfig, HttpSourceConfig, SourceKindConfig};
use super::secret::secret_string;
use crate::domain::errors::CensusError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CensusConfig
/// 4. Applies environment variable overrides (CENSUS_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - An override holds a value of the wrong type
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use census::config::loader::load_config;
///
/// let config = load_config("census.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CensusConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CensusError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CensusError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text; the steps after reading the file in [`load_config`]
///
/// # Errors
///
/// Same as [`load_config`], minus file access.
pub fn parse_config(contents: &str) -> Result<CensusConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: CensusConfig = toml::from_str(&contents)
        .map_err(|e| CensusError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config
        .validate()
        .map_err(|e| CensusError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| CensusError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(CensusError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_parsed<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|e| {
            CensusError::Configuration(format!("Invalid value '{raw}' for {name}: {e}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using the CENSUS_* prefix
///
/// Variables follow the pattern CENSUS_<SECTION>_<KEY>, for example
/// CENSUS_FETCH_MAX_RETRIES or CENSUS_SOURCE_HTTP_API_TOKEN.
fn apply_env_overrides(config: &mut CensusConfig) -> Result<()> {
    if let Ok(val) = std::env::var("CENSUS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Some(val) = env_parsed("CENSUS_FETCH_TIMEOUT_MS")? {
        config.fetch.timeout_ms = val;
    }
    if let Some(val) = env_parsed("CENSUS_FETCH_MAX_RETRIES")? {
        config.fetch.max_retries = val;
    }
    if let Some(val) = env_parsed("CENSUS_FETCH_RETRY_BACKOFF_MS")? {
        config.fetch.retry_backoff_ms = val;
    }
    if let Some(val) = env_parsed("CENSUS_JOB_OVERALL_TIMEOUT_SECS")? {
        config.job.overall_timeout_secs = val;
    }

    if let Ok(val) = std::env::var("CENSUS_SOURCE_KIND") {
        config.source.kind = match val.to_lowercase().as_str() {
            "filesystem" => SourceKindConfig::Filesystem,
            "http" => SourceKindConfig::Http,
            other => {
                return Err(CensusError::Configuration(format!(
                    "Invalid CENSUS_SOURCE_KIND '{other}'. Expected 'filesystem' or 'http'"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("CENSUS_SOURCE_DATA_DIR") {
        config.source.data_dir = Some(val);
    }
    if let Ok(val) = std::env::var("CENSUS_SOURCE_HTTP_BASE_URL") {
        match config.source.http.as_mut() {
            Some(http) => http.base_url = val,
            None => {
                config.source.http = Some(HttpSourceConfig {
                    base_url: val,
                    api_token: None,
                    timeout_seconds: 30,
                })
            }
        }
    }
    if let Ok(val) = std::env::var("CENSUS_SOURCE_HTTP_API_TOKEN") {
        if let Some(http) = config.source.http.as_mut() {
            http.api_token = Some(secret_string(val));
        }
    }

    if let Ok(val) = std::env::var("CENSUS_HISTORY_PATH") {
        config.history.path = val;
    }
    if let Ok(val) = std::env::var("CENSUS_OUTPUT_DIRECTORY") {
        config.output.directory = val;
    }

    if let Some(val) = env_parsed("CENSUS_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("CENSUS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("CENSUS_TEST_SUBST_VAR", "test_value");
        let input = "token = \"${CENSUS_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "token = \"test_value\"");
        std::env::remove_var("CENSUS_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("CENSUS_TEST_MISSING_VAR");
        let input = "token = \"${CENSUS_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("CENSUS_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# token = \"${CENSUS_TEST_NEVER_SET}\"\nkind = \"http\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${CENSUS_TEST_NEVER_SET}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-census.toml");
        assert!(matches!(result, Err(CensusError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        std::env::set_var("CENSUS_TEST_LOADER_TOKEN", "s3cret");
        let toml_content = r#"
[application]
log_level = "debug"

[fetch]
timeout_ms = 2500

[source]
kind = "http"

[source.http]
base_url = "https://records.example.org/api/v1"
api_token = "${CENSUS_TEST_LOADER_TOKEN}"

[history]
path = "/tmp/census-history.jsonl"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.fetch.timeout_ms, 2500);
        assert_eq!(config.fetch.max_retries, 2);
        let http = config.source.http.unwrap();
        assert_eq!(
            http.api_token.unwrap().expose_secret().as_ref(),
            "s3cret"
        );
        std::env::remove_var("CENSUS_TEST_LOADER_TOKEN");
    }

    #[test]
    fn test_validation_failure_is_configuration_error() {
        let result = parse_config(
            r#"
[source]
kind = "filesystem"
"#,
        );
        match result {
            Err(CensusError::Configuration(msg)) => assert!(msg.contains("data_dir")),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }
}
