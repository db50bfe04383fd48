//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers flowing through the export pipeline.
//! Each type guarantees a non-empty value and keeps the different id kinds
//! from being mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// School identifier newtype wrapper
///
/// Identifies the school whose records are being exported. It is also the
/// key of the single-flight table.
///
/// # Examples
///
/// ```
/// use census::domain::ids::SchoolId;
/// use std::str::FromStr;
///
/// let school_id = SchoolId::from_str("school-042").unwrap();
/// assert_eq!(school_id.as_str(), "school-042");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchoolId(String);

impl SchoolId {
    /// Creates a new SchoolId from a string
    ///
    /// The id names a directory in file-backed sources, so path separators
    /// and the `.`/`..` segments are rejected.
    ///
    /// # Returns
    ///
    /// Returns `Ok(SchoolId)` if the id is non-blank and a single path segment,
    /// `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("School ID cannot be empty".to_string());
        }
        if id.contains(['/', '\\', '\0']) || id == "." || id == ".." {
            return Err(format!("School ID '{id}' must be a single path segment"));
        }
        Ok(Self(id))
    }

    /// Returns the school ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchoolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SchoolId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SchoolId> for String {
    fn from(id: SchoolId) -> Self {
        id.0
    }
}

impl AsRef<str> for SchoolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Export job identifier
///
/// Generated when a caller requests an export. Used to poll status,
/// trigger generation and cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random job id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid job ID '{s}': {e}"))
    }
}

/// Export history identifier
///
/// One per terminal job, written into the history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportId(Uuid);

impl ExportId {
    /// Generates a fresh random export id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ExportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid export ID '{s}': {e}"))
    }
}
