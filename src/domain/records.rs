//! Source record types
//!
//! Typed shapes of the six collections returned by the record-store
//! collaborators. Required fields are plain values; anything the upstream
//! store may omit is an `Option`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six independent source collections of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Students,
    Staff,
    Classes,
    Subjects,
    Attendance,
    Assessments,
}

impl SourceKind {
    /// All sources, in a stable order
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Students,
        SourceKind::Staff,
        SourceKind::Classes,
        SourceKind::Subjects,
        SourceKind::Attendance,
        SourceKind::Assessments,
    ];

    /// Name used in errors, logs and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Staff => "staff",
            Self::Classes => "classes",
            Self::Subjects => "subjects",
            Self::Attendance => "attendance",
            Self::Assessments => "assessments",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Enrolled student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
}

/// Staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
}

/// Class (homeroom / form group)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub grade_level: String,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// Subject taught at the school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub department: Option<String>,
}

/// Attendance mark recorded for a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        };
        write!(f, "{s}")
    }
}

/// One attendance event as stored upstream
///
/// A store may hold several events for the same student and day when a mark
/// was corrected; collection order is the order they were recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub class_id: String,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// One assessment result as stored upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub student_id: String,
    pub subject_id: String,
    pub assessment_type: String,
    pub score: f64,
    pub max_score: f64,
    /// Letter grade as entered by the teacher, if any
    #[serde(default)]
    pub letter_grade: Option<String>,
    pub term: String,
    pub academic_year: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_names() {
        let names: Vec<&str> = SourceKind::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["students", "staff", "classes", "subjects", "attendance", "assessments"]
        );
    }

    #[test]
    fn test_attendance_event_deserialize() {
        let event: AttendanceEvent = serde_json::from_str(
            r#"{"studentId":"S1","date":"2024-03-01","status":"late","classId":"C1"}"#,
        )
        .unwrap();
        assert_eq!(event.status, AttendanceStatus::Late);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(event.recorded_at.is_none());
    }

    #[test]
    fn test_attendance_status_rejects_unknown() {
        let result: Result<AttendanceStatus, _> = serde_json::from_str("\"sick\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_assessment_optional_letter_grade() {
        let record: AssessmentRecord = serde_json::from_str(
            r#"{"studentId":"S1","subjectId":"MATH","assessmentType":"exam",
                "score":72.5,"maxScore":100,"term":"T1","academicYear":"2024"}"#,
        )
        .unwrap();
        assert!(record.letter_grade.is_none());
        assert_eq!(record.max_score, 100.0);
    }
}
