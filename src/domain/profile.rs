//! Compliance profile domain model
//!
//! The compliance profile is the school-level metadata the regulator needs
//! alongside the data snapshot. It is loaded from the profile collaborator and
//! is read-only to the pipeline. Required fields may be blank when loaded;
//! enforcing them is the job of the profile validator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// School category as reported to the regulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolCategory {
    /// Primary school
    Primary,
    /// Secondary school
    Secondary,
    /// Combined primary and secondary
    Combined,
}

impl fmt::Display for SchoolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Combined => "combined",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SchoolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "combined" => Ok(Self::Combined),
            other => Err(format!(
                "Invalid school category '{other}'. Must be one of: primary, secondary, combined"
            )),
        }
    }
}

/// School compliance metadata
///
/// Serialized verbatim as the `schoolInfo` block of the compliance document,
/// so the field names are part of the artifact schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceProfile {
    /// Regulator-issued institution code (unique)
    #[serde(default)]
    pub institution_code: String,

    /// Official institution name
    #[serde(default)]
    pub institution_name: String,

    /// Administrative district
    #[serde(default)]
    pub district: String,

    /// Administrative region
    #[serde(default)]
    pub region: String,

    /// School category
    pub category: SchoolCategory,

    /// Designated contact person for the submission
    #[serde(default)]
    pub contact_person: String,

    /// Contact phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Contact email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Builder for [`ComplianceProfile`]
///
/// Unset text fields default to blank so that incomplete profiles can be
/// constructed and then rejected by the validator.
///
/// # Examples
///
/// ```
/// use census::domain::profile::{ComplianceProfileBuilder, SchoolCategory};
///
/// let profile = ComplianceProfileBuilder::new(SchoolCategory::Primary)
///     .institution_code("INST-001")
///     .institution_name("Riverside Primary")
///     .build();
///
/// assert_eq!(profile.institution_code, "INST-001");
/// assert!(profile.district.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ComplianceProfileBuilder {
    profile: ComplianceProfile,
}

impl ComplianceProfileBuilder {
    /// Creates a builder for a school of the given category
    pub fn new(category: SchoolCategory) -> Self {
        Self {
            profile: ComplianceProfile {
                institution_code: String::new(),
                institution_name: String::new(),
                district: String::new(),
                region: String::new(),
                category,
                contact_person: String::new(),
                phone: None,
                email: None,
            },
        }
    }

    /// Sets the institution code
    pub fn institution_code(mut self, value: impl Into<String>) -> Self {
        self.profile.institution_code = value.into();
        self
    }

    /// Sets the institution name
    pub fn institution_name(mut self, value: impl Into<String>) -> Self {
        self.profile.institution_name = value.into();
        self
    }

    /// Sets the district
    pub fn district(mut self, value: impl Into<String>) -> Self {
        self.profile.district = value.into();
        self
    }

    /// Sets the region
    pub fn region(mut self, value: impl Into<String>) -> Self {
        self.profile.region = value.into();
        self
    }

    /// Sets the contact person
    pub fn contact_person(mut self, value: impl Into<String>) -> Self {
        self.profile.contact_person = value.into();
        self
    }

    /// Sets the phone number
    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.profile.phone = Some(value.into());
        self
    }

    /// Sets the email address
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.profile.email = Some(value.into());
        self
    }

    /// Builds the profile
    pub fn build(self) -> ComplianceProfile {
        self.profile
    }
}
