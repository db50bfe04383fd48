//! Export history entries
//!
//! One entry is appended to the history collaborator for every job that
//! reaches a terminal state. Entries are never mutated after creation.

use crate::domain::ids::{ExportId, JobId, SchoolId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    /// Artifact was generated
    Completed,
    /// Job ended in `error` (including cancellation and timeout)
    Failed,
}

/// Durable record of what happened to one export job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportHistoryEntry {
    pub export_id: ExportId,
    pub job_id: JobId,
    pub school_id: SchoolId,
    /// Period label, see [`ExportPeriod::label`](crate::domain::period::ExportPeriod::label)
    pub period: String,
    /// Sum of all aggregated record counts; 0 for failed jobs
    pub record_count: usize,
    pub status: HistoryStatus,
    pub timestamp: DateTime<Utc>,
    /// Error kind for failed jobs (e.g. "fetch", "cancelled")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Artifact fingerprint for completed jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl ExportHistoryEntry {
    /// Entry for a job that produced an artifact
    pub fn completed(
        job_id: JobId,
        school_id: SchoolId,
        period: String,
        record_count: usize,
        fingerprint: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            export_id: ExportId::generate(),
            job_id,
            school_id,
            period,
            record_count,
            status: HistoryStatus::Completed,
            timestamp,
            error_kind: None,
            fingerprint: Some(fingerprint),
        }
    }

    /// Entry for a job that ended in error
    pub fn failed(
        job_id: JobId,
        school_id: SchoolId,
        period: String,
        error_kind: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            export_id: ExportId::generate(),
            job_id,
            school_id,
            period,
            record_count: 0,
            status: HistoryStatus::Failed,
            timestamp,
            error_kind: Some(error_kind.to_string()),
            fingerprint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_entry_has_zero_records() {
        let entry = ExportHistoryEntry::failed(
            JobId::generate(),
            SchoolId::new("s1").unwrap(),
            "2024/T1".to_string(),
            "fetch",
            Utc::now(),
        );
        assert_eq!(entry.record_count, 0);
        assert_eq!(entry.status, HistoryStatus::Failed);
        assert_eq!(entry.error_kind.as_deref(), Some("fetch"));
    }

    #[test]
    fn test_entry_json_field_names() {
        let entry = ExportHistoryEntry::completed(
            JobId::generate(),
            SchoolId::new("s1").unwrap(),
            "2024/T1".to_string(),
            12,
            "abc".to_string(),
            Utc::now(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["recordCount"], 12);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["schoolId"], "s1");
        assert!(json.get("errorKind").is_none());
    }
}
