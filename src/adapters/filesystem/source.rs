//! JSON file record source and profile store

use crate::adapters::traits::{ProfileStore, RecordSource, SourceResult};
use crate::domain::errors::SourceError;
use crate::domain::ids::SchoolId;
use crate::domain::period::ExportPeriod;
use crate::domain::profile::ComplianceProfile;
use crate::domain::records::{
    AssessmentRecord, AttendanceEvent, ClassRecord, SourceKind, StaffRecord, StudentRecord,
    SubjectRecord,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads school records and profiles from a data directory
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    data_dir: PathBuf,
}

impl FileRecordSource {
    /// Create a source rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn school_dir(&self, school_id: &SchoolId) -> PathBuf {
        self.data_dir.join(school_id.as_str())
    }

    fn collection_path(&self, school_id: &SchoolId, source: SourceKind) -> PathBuf {
        self.school_dir(school_id)
            .join(format!("{}.json", source.as_str()))
    }

    fn period_path(
        &self,
        school_id: &SchoolId,
        source: SourceKind,
        period: &ExportPeriod,
    ) -> PathBuf {
        self.school_dir(school_id)
            .join(source.as_str())
            .join(format!("{}.json", period.file_stem()))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> SourceResult<T> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SourceError::NotFound(path.display().to_string()))
            }
            Err(e) => {
                return Err(SourceError::Unavailable(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| SourceError::InvalidData(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl ProfileStore for FileRecordSource {
    async fn get_compliance_profile(
        &self,
        school_id: &SchoolId,
    ) -> SourceResult<ComplianceProfile> {
        Self::read_json(&self.school_dir(school_id).join("profile.json")).await
    }
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn list_students(&self, school_id: &SchoolId) -> SourceResult<Vec<StudentRecord>> {
        Self::read_json(&self.collection_path(school_id, SourceKind::Students)).await
    }

    async fn list_staff(&self, school_id: &SchoolId) -> SourceResult<Vec<StaffRecord>> {
        Self::read_json(&self.collection_path(school_id, SourceKind::Staff)).await
    }

    async fn list_classes(&self, school_id: &SchoolId) -> SourceResult<Vec<ClassRecord>> {
        Self::read_json(&self.collection_path(school_id, SourceKind::Classes)).await
    }

    async fn list_subjects(&self, school_id: &SchoolId) -> SourceResult<Vec<SubjectRecord>> {
        Self::read_json(&self.collection_path(school_id, SourceKind::Subjects)).await
    }

    async fn list_attendance_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AttendanceEvent>> {
        Self::read_json(&self.period_path(school_id, SourceKind::Attendance, period)).await
    }

    async fn list_assessments_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AssessmentRecord>> {
        Self::read_json(&self.period_path(school_id, SourceKind::Assessments, period)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_reads_collections_and_period_files() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "s1/students.json",
            r#"[{"id":"S1","firstName":"Ama","lastName":"Owusu"}]"#,
        );
        write(
            temp.path(),
            "s1/attendance/2024_T1.json",
            r#"[{"studentId":"S1","date":"2024-03-01","status":"present","classId":"C1"}]"#,
        );

        let source = FileRecordSource::new(temp.path());
        let school = SchoolId::new("s1").unwrap();
        let period = ExportPeriod::new("2024", "T1").unwrap();

        let students = source.list_students(&school).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].first_name, "Ama");

        let attendance = source
            .list_attendance_for_period(&school, &period)
            .await
            .unwrap();
        assert_eq!(attendance.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let source = FileRecordSource::new(temp.path());
        let result = source.list_staff(&SchoolId::new("nope").unwrap()).await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_invalid_data() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "s1/classes.json", r#"[{"id": 7}]"#);
        let source = FileRecordSource::new(temp.path());
        let result = source.list_classes(&SchoolId::new("s1").unwrap()).await;
        assert!(matches!(result, Err(SourceError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_profile_read() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "s1/profile.json",
            r#"{"institutionCode":"INST-1","institutionName":"Hill School","district":"North",
                "region":"Upper","category":"secondary","contactPerson":"K. Boateng"}"#,
        );
        let source = FileRecordSource::new(temp.path());
        let profile = source
            .get_compliance_profile(&SchoolId::new("s1").unwrap())
            .await
            .unwrap();
        assert_eq!(profile.institution_code, "INST-1");
    }
}
