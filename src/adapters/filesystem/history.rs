//! JSON-lines export history log

use crate::adapters::traits::ExportHistoryStore;
use crate::domain::errors::CensusError;
use crate::domain::history::ExportHistoryEntry;
use crate::domain::ids::SchoolId;
use crate::domain::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON object per line to a history file
///
/// Appends are serialized through an internal lock so that concurrent jobs
/// never interleave partial lines.
#[derive(Debug)]
pub struct JsonLinesHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesHistoryStore {
    /// Create a store writing to `path`; parent directories are created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the history file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExportHistoryStore for JsonLinesHistoryStore {
    async fn append_export_history(&self, entry: &ExportHistoryEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    CensusError::History(format!(
                        "Failed to create history directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                CensusError::History(format!(
                    "Failed to open history file {}: {e}",
                    self.path.display()
                ))
            })?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| CensusError::History(format!("Failed to append history entry: {e}")))?;
        file.flush()
            .await
            .map_err(|e| CensusError::History(format!("Failed to flush history file: {e}")))?;

        Ok(())
    }

    async fn list_history(&self, school_id: Option<&SchoolId>) -> Result<Vec<ExportHistoryEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: ExportHistoryEntry = serde_json::from_str(line).map_err(|e| {
                CensusError::History(format!(
                    "Malformed history entry at {}:{}: {e}",
                    self.path.display(),
                    index + 1
                ))
            })?;
            if school_id.map_or(true, |id| &entry.school_id == id) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}
