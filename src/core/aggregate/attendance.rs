//! Attendance deduplication

use crate::domain::records::{AttendanceEvent, AttendanceStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final attendance mark for one student on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummaryRecord {
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub class_id: String,
}

impl From<&AttendanceEvent> for AttendanceSummaryRecord {
    fn from(event: &AttendanceEvent) -> Self {
        Self {
            student_id: event.student_id.clone(),
            date: event.date,
            status: event.status,
            class_id: event.class_id.clone(),
        }
    }
}

/// Fold events into one record per (student, date)
///
/// Later events in collection order replace earlier ones for the same key.
/// The result is ordered by student id, then date.
pub fn summarize_attendance(events: &[AttendanceEvent]) -> Vec<AttendanceSummaryRecord> {
    let mut latest: BTreeMap<(&str, NaiveDate), &AttendanceEvent> = BTreeMap::new();
    for event in events {
        latest.insert((event.student_id.as_str(), event.date), event);
    }
    latest.into_values().map(AttendanceSummaryRecord::from).collect()
}
