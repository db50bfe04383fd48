//! History command implementation
//!
//! Prints the entries of the export history log, oldest first.

use crate::adapters::create_collaborators;
use crate::config::load_config;
use crate::domain::history::{ExportHistoryEntry, HistoryStatus};
use crate::domain::ids::SchoolId;
use clap::Args;

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only show entries for this school
    #[arg(long)]
    pub school: Option<String>,

    /// Print entries as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl HistoryArgs {
    /// Execute the history command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let school = match self.school.as_deref().map(SchoolId::new).transpose() {
            Ok(school) => school,
            Err(e) => {
                eprintln!("Invalid --school: {e}");
                return Ok(2);
            }
        };

        let collaborators = create_collaborators(&config)?;
        let entries = collaborators.history.list_history(school.as_ref()).await?;
        tracing::debug!(count = entries.len(), "Loaded export history");

        if self.json {
            for entry in &entries {
                println!("{}", serde_json::to_string(entry)?);
            }
            return Ok(0);
        }

        if entries.is_empty() {
            println!("No exports recorded in {}", config.history.path);
            return Ok(0);
        }

        println!("📜 Export History ({} entries)", entries.len());
        println!();
        for entry in &entries {
            println!("  {}", format_entry(entry));
        }
        println!();
        Ok(0)
    }
}

fn format_entry(entry: &ExportHistoryEntry) -> String {
    let outcome = match entry.status {
        HistoryStatus::Completed => format!(
            "completed  {} records  sha256:{}",
            entry.record_count,
            entry.fingerprint.as_deref().unwrap_or("-")
        ),
        HistoryStatus::Failed => format!(
            "failed     {}",
            entry.error_kind.as_deref().unwrap_or("unknown")
        ),
    };
    format!(
        "{}  {}  {}  {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.school_id,
        entry.period,
        outcome
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::JobId;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_failed_entry() {
        let entry = ExportHistoryEntry::failed(
            JobId::generate(),
            SchoolId::new("s-001").unwrap(),
            "2024/T1".to_string(),
            "fetch",
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        );
        assert_eq!(
            format_entry(&entry),
            "2024-03-01 09:30:00  s-001  2024/T1  failed     fetch"
        );
    }

    #[test]
    fn test_format_completed_entry() {
        let entry = ExportHistoryEntry::completed(
            JobId::generate(),
            SchoolId::new("s-001").unwrap(),
            "2024/T1".to_string(),
            42,
            "abc123".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        );
        assert!(format_entry(&entry).ends_with("completed  42 records  sha256:abc123"));
    }
}
