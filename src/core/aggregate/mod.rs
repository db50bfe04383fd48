//! Aggregation of fetched collections into an export snapshot
//!
//! [`aggregate`] is a pure transform: it performs no I/O and yields the same
//! snapshot for the same record set and grading scale.

pub mod assessment;
pub mod attendance;
pub mod grading;
pub mod normalize;

pub use assessment::{summarize_assessments, AssessmentSummaryRecord};
pub use attendance::{summarize_attendance, AttendanceSummaryRecord};
pub use grading::{GradeBand, GradingScale};
pub use normalize::{ExportClass, ExportStaff, ExportStudent, ExportSubject};

use crate::core::fetch::SourceRecordSet;
use crate::domain::period::ExportPeriod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sizes of each exported collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCounts {
    pub students: usize,
    pub staff: usize,
    pub classes: usize,
    pub subjects: usize,
    pub attendance_summary: usize,
    pub assessment_summary: usize,
}

impl RecordCounts {
    /// Sum over every collection; the history `recordCount`
    pub fn total(&self) -> usize {
        self.students
            + self.staff
            + self.classes
            + self.subjects
            + self.attendance_summary
            + self.assessment_summary
    }
}

/// Everything the artifact is built from, already in export shape
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSnapshot {
    pub period: ExportPeriod,
    pub students: Vec<ExportStudent>,
    pub staff: Vec<ExportStaff>,
    pub classes: Vec<ExportClass>,
    pub subjects: Vec<ExportSubject>,
    pub attendance_summary: Vec<AttendanceSummaryRecord>,
    pub assessment_summary: Vec<AssessmentSummaryRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl AggregatedSnapshot {
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            students: self.students.len(),
            staff: self.staff.len(),
            classes: self.classes.len(),
            subjects: self.subjects.len(),
            attendance_summary: self.attendance_summary.len(),
            assessment_summary: self.assessment_summary.len(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.counts().total()
    }
}

/// Build the export snapshot from a fetched record set
pub fn aggregate(set: &SourceRecordSet, scale: &GradingScale) -> AggregatedSnapshot {
    AggregatedSnapshot {
        period: set.period.clone(),
        students: set.students.iter().map(ExportStudent::from).collect(),
        staff: set.staff.iter().map(ExportStaff::from).collect(),
        classes: set.classes.iter().map(ExportClass::from).collect(),
        subjects: set.subjects.iter().map(ExportSubject::from).collect(),
        attendance_summary: summarize_attendance(&set.attendance),
        assessment_summary: summarize_assessments(&set.assessments, scale),
        fetched_at: set.fetched_at,
    }
}
