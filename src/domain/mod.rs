//! Domain models and types for Census.
//!
//! This module contains the core domain models, types, and error hierarchy.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SchoolId`], [`JobId`], [`ExportId`])
//! - **The period selector** ([`ExportPeriod`])
//! - **School metadata** ([`ComplianceProfile`])
//! - **Source records** ([`StudentRecord`], [`AttendanceEvent`], ...)
//! - **History entries** ([`ExportHistoryEntry`])
//! - **Error types** ([`CensusError`], [`JobError`], [`SourceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so that a school id can never be passed
//! where a job id is expected:
//!
//! ```rust
//! use census::domain::{JobId, SchoolId};
//!
//! let school_id = SchoolId::new("school-1").unwrap();
//! let job_id = JobId::generate();
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: SchoolId = job_id;
//! # let _ = (school_id, job_id);
//! ```

pub mod errors;
pub mod history;
pub mod ids;
pub mod period;
pub mod profile;
pub mod records;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{CensusError, ErrorCategory, FieldError, JobError, SourceError};
pub use history::{ExportHistoryEntry, HistoryStatus};
pub use ids::{ExportId, JobId, SchoolId};
pub use period::ExportPeriod;
pub use profile::{ComplianceProfile, ComplianceProfileBuilder, SchoolCategory};
pub use records::{
    AssessmentRecord, AttendanceEvent, AttendanceStatus, ClassRecord, SourceKind, StaffRecord,
    StudentRecord, SubjectRecord,
};
pub use result::Result;
