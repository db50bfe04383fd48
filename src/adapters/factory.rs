//! Collaborator factory
//!
//! This module wires concrete collaborator implementations from configuration.
//! The choice is made once here; the pipeline only ever sees the traits.

use crate::adapters::filesystem::{FileRecordSource, JsonLinesHistoryStore};
use crate::adapters::http::HttpRecordSource;
use crate::adapters::traits::{ExportHistoryStore, ProfileStore, RecordSource};
use crate::config::schema::{CensusConfig, SourceKindConfig};
use crate::domain::{CensusError, Result};
use std::sync::Arc;

/// The set of collaborators an export manager needs
#[derive(Clone)]
pub struct Collaborators {
    pub profiles: Arc<dyn ProfileStore>,
    pub records: Arc<dyn RecordSource>,
    pub history: Arc<dyn ExportHistoryStore>,
}

/// Create collaborators based on the configuration
///
/// # Errors
///
/// Returns an error if the configured source section is missing or the
/// source client cannot be created.
pub fn create_collaborators(config: &CensusConfig) -> Result<Collaborators> {
    let history: Arc<dyn ExportHistoryStore> =
        Arc::new(JsonLinesHistoryStore::new(&config.history.path));

    match config.source.kind {
        SourceKindConfig::Filesystem => {
            let data_dir = config.source.data_dir.as_ref().ok_or_else(|| {
                CensusError::Configuration(
                    "source.data_dir is required when source.kind = 'filesystem'".to_string(),
                )
            })?;

            tracing::info!(data_dir = %data_dir, "Creating filesystem record source");
            let source = Arc::new(FileRecordSource::new(data_dir));

            Ok(Collaborators {
                profiles: source.clone(),
                records: source,
                history,
            })
        }
        SourceKindConfig::Http => {
            let http_config = config.source.http.as_ref().ok_or_else(|| {
                CensusError::Configuration(
                    "[source.http] is required when source.kind = 'http'".to_string(),
                )
            })?;

            tracing::info!(base_url = %http_config.base_url, "Creating HTTP record source");
            let source = Arc::new(HttpRecordSource::new(http_config)?);

            Ok(Collaborators {
                profiles: source.clone(),
                records: source,
                history,
            })
        }
    }
}
