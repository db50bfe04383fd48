//! Fan-out/fan-in over the six record sources

use super::retry::{fetch_with_retry, FetchPolicy};
use super::FetchError;
use crate::adapters::traits::{RecordSource, SourceResult};
use crate::domain::ids::SchoolId;
use crate::domain::period::ExportPeriod;
use crate::domain::records::{
    AssessmentRecord, AttendanceEvent, ClassRecord, SourceKind, StaffRecord, StudentRecord,
    SubjectRecord,
};
use crate::log_source_fetched;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// The six collections fetched for one job, plus when the join completed
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecordSet {
    pub period: ExportPeriod,
    pub students: Vec<StudentRecord>,
    pub staff: Vec<StaffRecord>,
    pub classes: Vec<ClassRecord>,
    pub subjects: Vec<SubjectRecord>,
    pub attendance: Vec<AttendanceEvent>,
    pub assessments: Vec<AssessmentRecord>,
    pub fetched_at: DateTime<Utc>,
}

/// Receives a call each time one more source has been fetched
///
/// `completed` counts up from 1 to 6 in call order, whatever order the
/// sources themselves finish in.
pub trait FetchProgress: Send + Sync {
    fn source_completed(&self, source: SourceKind, completed: usize, total: usize);
}

/// Progress sink that discards every update
impl FetchProgress for () {
    fn source_completed(&self, _source: SourceKind, _completed: usize, _total: usize) {}
}

struct Completion<'a> {
    done: AtomicUsize,
    sink: &'a dyn FetchProgress,
}

impl Completion<'_> {
    fn record(&self, source: SourceKind) {
        let completed = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        self.sink
            .source_completed(source, completed, SourceKind::ALL.len());
    }
}

/// Reads all record collections for a school through a [`RecordSource`]
///
/// # Example
///
/// ```no_run
/// use census::adapters::memory::InMemoryRecordSource;
/// use census::core::fetch::{FetchPolicy, SourceFetcher};
/// use census::domain::{ExportPeriod, SchoolId};
/// use std::sync::Arc;
/// use tokio::sync::watch;
///
/// # async fn example() {
/// let fetcher = SourceFetcher::new(Arc::new(InMemoryRecordSource::new()), FetchPolicy::default());
/// let (_cancel_tx, cancel_rx) = watch::channel(false);
/// let school = SchoolId::new("s-001").unwrap();
/// let period = ExportPeriod::new("2024", "T1").unwrap();
///
/// let set = fetcher.fetch_all(&school, &period, &cancel_rx, &()).await;
/// # }
/// ```
#[derive(Clone)]
pub struct SourceFetcher {
    records: Arc<dyn RecordSource>,
    policy: FetchPolicy,
}

impl SourceFetcher {
    pub fn new(records: Arc<dyn RecordSource>, policy: FetchPolicy) -> Self {
        Self { records, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch all six collections concurrently
    ///
    /// # Errors
    ///
    /// - [`FetchError::Exhausted`] naming the first source that ran out of
    ///   attempts; the remaining reads are dropped
    /// - [`FetchError::Cancelled`] if `cancel` was raised; reads already in
    ///   flight finish their current attempt first
    pub async fn fetch_all(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
        cancel: &watch::Receiver<bool>,
        progress: &dyn FetchProgress,
    ) -> Result<SourceRecordSet, FetchError> {
        let completion = Completion {
            done: AtomicUsize::new(0),
            sink: progress,
        };
        let records = self.records.as_ref();

        tracing::debug!(school_id = %school_id, period = %period, "Fetching sources");

        let (students, staff, classes, subjects, attendance, assessments) = tokio::try_join!(
            self.fetch_source(SourceKind::Students, cancel, &completion, || {
                records.list_students(school_id)
            }),
            self.fetch_source(SourceKind::Staff, cancel, &completion, || {
                records.list_staff(school_id)
            }),
            self.fetch_source(SourceKind::Classes, cancel, &completion, || {
                records.list_classes(school_id)
            }),
            self.fetch_source(SourceKind::Subjects, cancel, &completion, || {
                records.list_subjects(school_id)
            }),
            self.fetch_source(SourceKind::Attendance, cancel, &completion, || {
                records.list_attendance_for_period(school_id, period)
            }),
            self.fetch_source(SourceKind::Assessments, cancel, &completion, || {
                records.list_assessments_for_period(school_id, period)
            }),
        )?;

        match (students, staff, classes, subjects, attendance, assessments) {
            (
                Some(students),
                Some(staff),
                Some(classes),
                Some(subjects),
                Some(attendance),
                Some(assessments),
            ) if !*cancel.borrow() => Ok(SourceRecordSet {
                period: period.clone(),
                students,
                staff,
                classes,
                subjects,
                attendance,
                assessments,
                fetched_at: Utc::now(),
            }),
            _ => Err(FetchError::Cancelled),
        }
    }

    async fn fetch_source<T, F, Fut>(
        &self,
        source: SourceKind,
        cancel: &watch::Receiver<bool>,
        completion: &Completion<'_>,
        operation: F,
    ) -> Result<Option<Vec<T>>, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SourceResult<Vec<T>>>,
    {
        let mut cancel = cancel.clone();
        let fetched = fetch_with_retry(source, &self.policy, &mut cancel, operation).await?;

        Ok(fetched.map(|fetched| {
            log_source_fetched!(source, fetched.value.len(), fetched.attempts);
            completion.record(source);
            fetched.value
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryRecordSource, SchoolRecords};
    use crate::domain::errors::SourceError;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recorder(Mutex<Vec<(SourceKind, usize)>>);

    impl FetchProgress for Recorder {
        fn source_completed(&self, source: SourceKind, completed: usize, _total: usize) {
            self.0.lock().unwrap().push((source, completed));
        }
    }

    fn school() -> SchoolId {
        SchoolId::new("s1").unwrap()
    }

    fn period() -> ExportPeriod {
        ExportPeriod::new("2024", "T1").unwrap()
    }

    fn policy() -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_millis(200),
            max_retries: 2,
            backoff: Duration::from_millis(50),
        }
    }

    fn seeded() -> Arc<InMemoryRecordSource> {
        let source = InMemoryRecordSource::new();
        let mut records = SchoolRecords::default();
        records.students.push(StudentRecord {
            id: "S1".to_string(),
            first_name: "Ama".to_string(),
            last_name: "Owusu".to_string(),
            date_of_birth: None,
            gender: None,
            class_id: None,
            enrollment_date: None,
        });
        source.insert_school(school(), records);
        Arc::new(source)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_all_reports_each_source_once() {
        let source = seeded();
        let fetcher = SourceFetcher::new(source.clone(), policy());
        let (_tx, rx) = watch::channel(false);
        let recorder = Recorder(Mutex::new(Vec::new()));

        let set = fetcher
            .fetch_all(&school(), &period(), &rx, &recorder)
            .await
            .unwrap();

        assert_eq!(set.students.len(), 1);
        let seen = recorder.0.lock().unwrap();
        let counts: Vec<usize> = seen.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, vec![1, 2, 3, 4, 5, 6]);
        let mut kinds: Vec<SourceKind> = seen.iter().map(|(k, _)| *k).collect();
        kinds.sort();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
        assert_eq!(source.total_calls(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_succeed() {
        let source = seeded();
        source.fail_times(
            SourceKind::Staff,
            2,
            SourceError::Unavailable("blip".to_string()),
        );
        let fetcher = SourceFetcher::new(source.clone(), policy());
        let (_tx, rx) = watch::channel(false);

        fetcher
            .fetch_all(&school(), &period(), &rx, &())
            .await
            .unwrap();
        assert_eq!(source.calls(SourceKind::Staff), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_names_source() {
        let source = seeded();
        source.delay(SourceKind::Assessments, Duration::from_secs(5));
        let fetcher = SourceFetcher::new(source.clone(), policy());
        let (_tx, rx) = watch::channel(false);

        let err = fetcher
            .fetch_all(&school(), &period(), &rx, &())
            .await
            .unwrap_err();

        match err {
            FetchError::Exhausted {
                source_kind,
                attempts,
                ..
            } => {
                assert_eq!(source_kind, SourceKind::Assessments);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(source.calls(SourceKind::Assessments), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let source = seeded();
        let fetcher = SourceFetcher::new(source.clone(), policy());
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let err = fetcher
            .fetch_all(&school(), &period(), &rx, &())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Cancelled);
        assert_eq!(source.total_calls(), 0);
    }
}
