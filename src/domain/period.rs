//! Export period selector
//!
//! A period identifies which slice of attendance and assessment data an export
//! covers. Student, staff, class and subject lists are not period-scoped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Period selector for an export
///
/// # Examples
///
/// ```
/// use census::domain::period::ExportPeriod;
///
/// let period = ExportPeriod::new("2023/2024", "term-2").unwrap();
/// assert_eq!(period.label(), "2023/2024/term-2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPeriod {
    /// Academic year, e.g. "2023/2024"
    pub academic_year: String,

    /// Term within the academic year, e.g. "term-2"
    pub term: String,
}

impl ExportPeriod {
    /// Creates a new period, rejecting blank components
    ///
    /// The term may not contain `/`, so a label always splits back into its
    /// year and term at the last `/`.
    pub fn new(academic_year: impl Into<String>, term: impl Into<String>) -> Result<Self, String> {
        let academic_year = academic_year.into();
        let term = term.into();
        if academic_year.trim().is_empty() {
            return Err("Academic year cannot be empty".to_string());
        }
        if term.trim().is_empty() {
            return Err("Term cannot be empty".to_string());
        }
        if term.contains('/') {
            return Err(format!("Term '{term}' cannot contain '/'"));
        }
        Ok(Self {
            academic_year,
            term,
        })
    }

    /// Stable label used in history entries and log fields
    pub fn label(&self) -> String {
        format!("{}/{}", self.academic_year, self.term)
    }

    /// Filesystem-safe form of the label: `<year>_<term>`
    ///
    /// Bytes other than ASCII alphanumerics and `-` are written as `%XX`, so
    /// distinct periods never share a stem.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", escape(&self.academic_year), escape(&self.term))
    }
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

impl fmt::Display for ExportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
