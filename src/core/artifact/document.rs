//! The compliance file format
//!
//! Field names are part of the regulator's ingestion contract and only change
//! together with [`SCHEMA_VERSION`].

use crate::core::aggregate::{
    AssessmentSummaryRecord, AttendanceSummaryRecord, ExportClass, ExportStaff, ExportStudent,
    ExportSubject,
};
use crate::domain::profile::ComplianceProfile;
use serde::Serialize;

pub const SCHEMA_VERSION: &str = "1.0";

pub const MEDIA_TYPE: &str = "application/json";

/// Top-level compliance document, borrowed from a snapshot and profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceDocument<'a> {
    pub schema_version: &'static str,
    /// ISO-8601 UTC timestamp with second precision
    pub export_date: String,
    pub school_info: &'a ComplianceProfile,
    pub academic_year: &'a str,
    pub period: &'a str,
    pub students: &'a [ExportStudent],
    pub staff: &'a [ExportStaff],
    pub classes: &'a [ExportClass],
    pub subjects: &'a [ExportSubject],
    pub attendance_summary: &'a [AttendanceSummaryRecord],
    pub assessment_summary: &'a [AssessmentSummaryRecord],
}
