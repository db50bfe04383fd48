//! In-memory collaborator implementations
//!
//! Used by tests and by callers that embed the pipeline with records they
//! already hold. The record source can be scripted to fail or stall per
//! source, which is how retry, timeout and cancellation paths are exercised.

use crate::adapters::traits::{ExportHistoryStore, ProfileStore, RecordSource, SourceResult};
use crate::domain::errors::SourceError;
use crate::domain::history::ExportHistoryEntry;
use crate::domain::ids::SchoolId;
use crate::domain::period::ExportPeriod;
use crate::domain::profile::ComplianceProfile;
use crate::domain::records::{
    AssessmentRecord, AttendanceEvent, ClassRecord, SourceKind, StaffRecord, StudentRecord,
    SubjectRecord,
};
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Profile store backed by a map
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<SchoolId, ComplianceProfile>>,
    delay: Mutex<Option<Duration>>,
}

impl InMemoryProfileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a school's profile
    pub fn insert(&self, school_id: SchoolId, profile: ComplianceProfile) {
        lock(&self.profiles).insert(school_id, profile);
    }

    /// Delay every lookup by `delay` before answering
    pub fn delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_compliance_profile(
        &self,
        school_id: &SchoolId,
    ) -> SourceResult<ComplianceProfile> {
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.profiles)
            .get(school_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("profile for school {school_id}")))
    }
}

/// All collections held for one school
#[derive(Debug, Clone, Default)]
pub struct SchoolRecords {
    pub students: Vec<StudentRecord>,
    pub staff: Vec<StaffRecord>,
    pub classes: Vec<ClassRecord>,
    pub subjects: Vec<SubjectRecord>,
    pub attendance: HashMap<ExportPeriod, Vec<AttendanceEvent>>,
    pub assessments: HashMap<ExportPeriod, Vec<AssessmentRecord>>,
}

#[derive(Debug, Clone)]
struct ScriptedFailure {
    /// `None` fails forever
    remaining: Option<u32>,
    error: SourceError,
}

/// Record source backed by in-memory collections
///
/// Unknown schools and periods yield empty collections.
#[derive(Debug, Default)]
pub struct InMemoryRecordSource {
    schools: Mutex<HashMap<SchoolId, SchoolRecords>>,
    failures: Mutex<HashMap<SourceKind, ScriptedFailure>>,
    delays: Mutex<HashMap<SourceKind, Duration>>,
    calls: Mutex<HashMap<SourceKind, u32>>,
}

impl InMemoryRecordSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace all records of a school
    pub fn insert_school(&self, school_id: SchoolId, records: SchoolRecords) {
        lock(&self.schools).insert(school_id, records);
    }

    /// Make every call to `source` fail with `error`
    pub fn fail_always(&self, source: SourceKind, error: SourceError) {
        lock(&self.failures).insert(
            source,
            ScriptedFailure {
                remaining: None,
                error,
            },
        );
    }

    /// Make the next `times` calls to `source` fail with `error`
    pub fn fail_times(&self, source: SourceKind, times: u32, error: SourceError) {
        lock(&self.failures).insert(
            source,
            ScriptedFailure {
                remaining: Some(times),
                error,
            },
        );
    }

    /// Delay every call to `source` by `delay` before answering
    pub fn delay(&self, source: SourceKind, delay: Duration) {
        lock(&self.delays).insert(source, delay);
    }

    /// Number of calls made to `source` so far
    pub fn calls(&self, source: SourceKind) -> u32 {
        lock(&self.calls).get(&source).copied().unwrap_or(0)
    }

    /// Total number of calls across all sources
    pub fn total_calls(&self) -> u32 {
        lock(&self.calls).values().sum()
    }

    async fn enter(&self, source: SourceKind) -> SourceResult<()> {
        *lock(&self.calls).entry(source).or_insert(0) += 1;

        let delay = lock(&self.delays).get(&source).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut failures = lock(&self.failures);
        if let Some(failure) = failures.get_mut(&source) {
            match failure.remaining {
                None => return Err(failure.error.clone()),
                Some(0) => {}
                Some(ref mut n) => {
                    *n -= 1;
                    return Err(failure.error.clone());
                }
            }
        }
        Ok(())
    }

    fn with_school<T>(&self, school_id: &SchoolId, f: impl FnOnce(&SchoolRecords) -> T) -> T
    where
        T: Default,
    {
        lock(&self.schools).get(school_id).map(f).unwrap_or_default()
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn list_students(&self, school_id: &SchoolId) -> SourceResult<Vec<StudentRecord>> {
        self.enter(SourceKind::Students).await?;
        Ok(self.with_school(school_id, |r| r.students.clone()))
    }

    async fn list_staff(&self, school_id: &SchoolId) -> SourceResult<Vec<StaffRecord>> {
        self.enter(SourceKind::Staff).await?;
        Ok(self.with_school(school_id, |r| r.staff.clone()))
    }

    async fn list_classes(&self, school_id: &SchoolId) -> SourceResult<Vec<ClassRecord>> {
        self.enter(SourceKind::Classes).await?;
        Ok(self.with_school(school_id, |r| r.classes.clone()))
    }

    async fn list_subjects(&self, school_id: &SchoolId) -> SourceResult<Vec<SubjectRecord>> {
        self.enter(SourceKind::Subjects).await?;
        Ok(self.with_school(school_id, |r| r.subjects.clone()))
    }

    async fn list_attendance_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AttendanceEvent>> {
        self.enter(SourceKind::Attendance).await?;
        Ok(self.with_school(school_id, |r| {
            r.attendance.get(period).cloned().unwrap_or_default()
        }))
    }

    async fn list_assessments_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AssessmentRecord>> {
        self.enter(SourceKind::Assessments).await?;
        Ok(self.with_school(school_id, |r| {
            r.assessments.get(period).cloned().unwrap_or_default()
        }))
    }
}

/// History store that keeps entries in a vector
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<Vec<ExportHistoryEntry>>,
    delay: Mutex<Option<Duration>>,
}

impl InMemoryHistoryStore {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries written so far
    pub fn entries(&self) -> Vec<ExportHistoryEntry> {
        lock(&self.entries).clone()
    }

    /// Delay every append by `delay` before storing the entry
    pub fn delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }
}

#[async_trait]
impl ExportHistoryStore for InMemoryHistoryStore {
    async fn append_export_history(&self, entry: &ExportHistoryEntry) -> Result<()> {
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.entries).push(entry.clone());
        Ok(())
    }

    async fn list_history(&self, school_id: Option<&SchoolId>) -> Result<Vec<ExportHistoryEntry>> {
        Ok(lock(&self.entries)
            .iter()
            .filter(|e| school_id.map_or(true, |id| &e.school_id == id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{ComplianceProfileBuilder, SchoolCategory};

    fn school() -> SchoolId {
        SchoolId::new("s1").unwrap()
    }

    #[tokio::test]
    async fn test_profile_store_not_found() {
        let store = InMemoryProfileStore::new();
        let result = store.get_compliance_profile(&school()).await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_profile_store_round_trip() {
        let store = InMemoryProfileStore::new();
        let profile = ComplianceProfileBuilder::new(SchoolCategory::Primary)
            .institution_code("I-1")
            .build();
        store.insert(school(), profile.clone());
        assert_eq!(store.get_compliance_profile(&school()).await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_fail_times_then_succeeds() {
        let source = InMemoryRecordSource::new();
        source.fail_times(
            SourceKind::Staff,
            2,
            SourceError::Unavailable("down".to_string()),
        );

        assert!(source.list_staff(&school()).await.is_err());
        assert!(source.list_staff(&school()).await.is_err());
        assert!(source.list_staff(&school()).await.is_ok());
        assert_eq!(source.calls(SourceKind::Staff), 3);
        assert_eq!(source.calls(SourceKind::Students), 0);
    }

    #[tokio::test]
    async fn test_unknown_school_yields_empty() {
        let source = InMemoryRecordSource::new();
        assert!(source.list_students(&school()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_filter_by_school() {
        use chrono::Utc;
        use crate::domain::ids::JobId;

        let history = InMemoryHistoryStore::new();
        for id in ["a", "b", "a"] {
            history
                .append_export_history(&ExportHistoryEntry::failed(
                    JobId::generate(),
                    SchoolId::new(id).unwrap(),
                    "2024/T1".to_string(),
                    "cancelled",
                    Utc::now(),
                ))
                .await
                .unwrap();
        }

        let only_a = history
            .list_history(Some(&SchoolId::new("a").unwrap()))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 2);
        assert_eq!(history.list_history(None).await.unwrap().len(), 3);
    }
}
