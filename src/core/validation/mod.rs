//! Compliance profile validation
//!
//! Every required field is checked independently, so a profile missing three
//! fields yields three [`FieldError`]s in one pass.

use crate::domain::errors::FieldError;
use crate::domain::profile::ComplianceProfile;

/// Outcome of validating a compliance profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Never empty
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Field errors; empty when valid
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }
}

/// Validate the fields a submission cannot go out without
///
/// # Examples
///
/// ```
/// use census::core::validation::validate;
/// use census::domain::{ComplianceProfileBuilder, SchoolCategory};
///
/// let profile = ComplianceProfileBuilder::new(SchoolCategory::Primary)
///     .institution_code("INST-7")
///     .institution_name("Riverside Primary")
///     .region("Coastal")
///     .build();
///
/// let result = validate(&profile);
/// let fields: Vec<_> = result.errors().iter().map(|e| e.field.as_str()).collect();
/// assert_eq!(fields, ["district", "contactPerson"]);
/// ```
pub fn validate(profile: &ComplianceProfile) -> ValidationResult {
    let required = [
        ("institutionCode", &profile.institution_code),
        ("institutionName", &profile.institution_name),
        ("district", &profile.district),
        ("region", &profile.region),
        ("contactPerson", &profile.contact_person),
    ];

    let errors: Vec<FieldError> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError::new(*field, "is required"))
        .collect();

    if errors.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(errors)
    }
}
