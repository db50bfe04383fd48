//! Export-schema shapes of the pass-through collections

use crate::domain::records::{ClassRecord, StaffRecord, StudentRecord, SubjectRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStudent {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub class_id: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStaff {
    pub staff_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub email: Option<String>,
    pub qualification: Option<String>,
    pub employment_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportClass {
    pub class_id: String,
    pub name: String,
    pub grade_level: String,
    pub teacher_id: Option<String>,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSubject {
    pub subject_id: String,
    pub name: String,
    pub code: String,
    pub department: Option<String>,
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

fn trimmed_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl From<&StudentRecord> for ExportStudent {
    fn from(record: &StudentRecord) -> Self {
        Self {
            student_id: trimmed(&record.id),
            first_name: trimmed(&record.first_name),
            last_name: trimmed(&record.last_name),
            date_of_birth: record.date_of_birth,
            gender: trimmed_opt(&record.gender),
            class_id: trimmed_opt(&record.class_id),
            enrollment_date: record.enrollment_date,
        }
    }
}

impl From<&StaffRecord> for ExportStaff {
    fn from(record: &StaffRecord) -> Self {
        Self {
            staff_id: trimmed(&record.id),
            first_name: trimmed(&record.first_name),
            last_name: trimmed(&record.last_name),
            role: trimmed(&record.role),
            email: trimmed_opt(&record.email),
            qualification: trimmed_opt(&record.qualification),
            employment_type: trimmed_opt(&record.employment_type),
        }
    }
}

impl From<&ClassRecord> for ExportClass {
    fn from(record: &ClassRecord) -> Self {
        Self {
            class_id: trimmed(&record.id),
            name: trimmed(&record.name),
            grade_level: trimmed(&record.grade_level),
            teacher_id: trimmed_opt(&record.teacher_id),
            capacity: record.capacity,
        }
    }
}

impl From<&SubjectRecord> for ExportSubject {
    fn from(record: &SubjectRecord) -> Self {
        Self {
            subject_id: trimmed(&record.id),
            name: trimmed(&record.name),
            code: trimmed(&record.code),
            department: trimmed_opt(&record.department),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_reshaped_and_trimmed() {
        let record = StudentRecord {
            id: " S1 ".to_string(),
            first_name: "Ama ".to_string(),
            last_name: "Owusu".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2012, 5, 4),
            gender: Some("  ".to_string()),
            class_id: Some("C1".to_string()),
            enrollment_date: None,
        };
        let student = ExportStudent::from(&record);
        assert_eq!(student.student_id, "S1");
        assert_eq!(student.first_name, "Ama");
        assert!(student.gender.is_none());

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["studentId"], "S1");
        assert!(json["enrollmentDate"].is_null());
    }

    #[test]
    fn test_staff_field_names() {
        let staff = ExportStaff::from(&StaffRecord {
            id: "T9".to_string(),
            first_name: "Kwame".to_string(),
            last_name: "Mensah".to_string(),
            role: "teacher".to_string(),
            email: None,
            qualification: Some("B.Ed".to_string()),
            employment_type: None,
        });
        let json = serde_json::to_value(&staff).unwrap();
        assert_eq!(json["staffId"], "T9");
        assert_eq!(json["qualification"], "B.Ed");
        assert!(json.get("employmentType").is_some());
    }
}
