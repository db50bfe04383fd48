//! Collaborator traits
//!
//! This module defines the narrow interfaces the export pipeline consumes.
//! Record stores, the profile store and the history log all live outside the
//! core; a concrete implementation is chosen once, at construction time.

use crate::domain::errors::SourceError;
use crate::domain::history::ExportHistoryEntry;
use crate::domain::ids::SchoolId;
use crate::domain::period::ExportPeriod;
use crate::domain::profile::ComplianceProfile;
use crate::domain::records::{
    AssessmentRecord, AttendanceEvent, ClassRecord, StaffRecord, StudentRecord, SubjectRecord,
};
use crate::domain::Result;
use async_trait::async_trait;

/// Result of a collaborator read
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Read access to a school's compliance profile
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load the compliance profile for a school
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] if the school has no profile, or
    /// another [`SourceError`] if the store cannot be read.
    async fn get_compliance_profile(&self, school_id: &SchoolId)
        -> SourceResult<ComplianceProfile>;
}

/// Read access to the six record collections of a school
///
/// Implementations must not mutate the underlying store. Each call is an
/// independent request; the fetcher applies timeouts and retries around it.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// List enrolled students
    async fn list_students(&self, school_id: &SchoolId) -> SourceResult<Vec<StudentRecord>>;

    /// List staff members
    async fn list_staff(&self, school_id: &SchoolId) -> SourceResult<Vec<StaffRecord>>;

    /// List classes
    async fn list_classes(&self, school_id: &SchoolId) -> SourceResult<Vec<ClassRecord>>;

    /// List subjects
    async fn list_subjects(&self, school_id: &SchoolId) -> SourceResult<Vec<SubjectRecord>>;

    /// List attendance events recorded during the period, in recording order
    async fn list_attendance_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AttendanceEvent>>;

    /// List assessment results recorded during the period
    async fn list_assessments_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AssessmentRecord>>;
}

/// Append-only export history log
#[async_trait]
pub trait ExportHistoryStore: Send + Sync {
    /// Append one entry
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::History`](crate::domain::CensusError::History)
    /// if the entry cannot be persisted.
    async fn append_export_history(&self, entry: &ExportHistoryEntry) -> Result<()>;

    /// List entries, oldest first, optionally restricted to one school
    async fn list_history(&self, school_id: Option<&SchoolId>) -> Result<Vec<ExportHistoryEntry>>;
}
