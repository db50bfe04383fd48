//! Domain error types
//!
//! This module defines the error hierarchy for Census. All errors are
//! domain-specific and don't expose third-party types.
//!
//! - [`CensusError`] is the crate-wide error returned by fallible operations.
//! - [`JobError`] is the typed detail an export job carries once it has
//!   reached `error`. It is cloneable so that status snapshots can hand it out.
//! - [`SourceError`] is what a record-store collaborator reports.

use crate::domain::ids::{JobId, SchoolId};
use crate::domain::records::SourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main Census error type
#[derive(Debug, Error)]
pub enum CensusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A job reached a terminal error
    #[error(transparent)]
    Job(#[from] JobError),

    /// A collaborator failed outside of a job's fetch stage
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Single-flight violation: the school already has a non-terminal job
    #[error("An export is already in progress for school {school_id} (job {job_id})")]
    AlreadyInProgress { school_id: SchoolId, job_id: JobId },

    /// Operation not permitted in the job's current state
    #[error("Cannot {operation} job {job_id} while it is {state}")]
    IllegalState {
        job_id: JobId,
        state: String,
        operation: &'static str,
    },

    /// No job with this id is known
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// Writing or reading export history failed
    #[error("Export history error: {0}")]
    History(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// One field-level validation failure on the compliance profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Profile field name, in the artifact's camelCase form
    pub field: String,

    /// Human-readable reason
    pub reason: String,
}

impl FieldError {
    /// Creates a new field error
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// How a caller should react to a job error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The compliance profile needs to be fixed
    FixProfile,
    /// A transient condition; retrying later may succeed
    RetryLater,
    /// The caller stopped the job
    Cancelled,
    /// A defect or unrepresentable data; needs investigation
    SystemProblem,
}

/// Terminal error detail of an export job
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobError {
    /// Required compliance profile fields are missing
    #[error("Compliance profile is incomplete: {}", join_fields(.errors))]
    Validation { errors: Vec<FieldError> },

    /// The profile collaborator has no profile for the school
    #[error("No compliance profile found for school {school_id}")]
    ProfileNotFound { school_id: String },

    /// The profile collaborator failed for another reason
    #[error("Could not load compliance profile for school {school_id}: {message}")]
    ProfileUnavailable { school_id: String, message: String },

    /// A source failed after exhausting its retries
    #[error("Failed to fetch {failed_source} after {attempts} attempt(s): {message}")]
    Fetch {
        failed_source: SourceKind,
        attempts: u32,
        message: String,
    },

    /// The overall job deadline elapsed
    #[error("Export job exceeded its time limit of {limit_secs}s")]
    Timeout { limit_secs: u64 },

    /// The caller cancelled the job
    #[error("Export job was cancelled")]
    Cancelled,

    /// The snapshot could not be represented in the compliance format
    #[error("Cannot serialize {path}: {message}")]
    Serialization { path: String, message: String },
}

impl JobError {
    /// Short stable name of the error kind, recorded in history
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::ProfileNotFound { .. } => "profile_not_found",
            Self::ProfileUnavailable { .. } => "profile_unavailable",
            Self::Fetch { .. } => "fetch",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// Guidance category for the caller
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::ProfileNotFound { .. } => ErrorCategory::FixProfile,
            Self::ProfileUnavailable { .. } | Self::Fetch { .. } | Self::Timeout { .. } => {
                ErrorCategory::RetryLater
            }
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Serialization { .. } => ErrorCategory::SystemProblem,
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Record-store collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The store could not be reached or answered with a server error
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// A single request exceeded its timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store answered with data that does not match the record schema
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for CensusError {
    fn from(err: std::io::Error) -> Self {
        CensusError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CensusError {
    fn from(err: serde_json::Error) -> Self {
        CensusError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CensusError {
    fn from(err: toml::de::Error) -> Self {
        CensusError::Configuration(format!("TOML parse error: {err}"))
    }
}
