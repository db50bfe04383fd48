//! Export job state machine

use crate::core::aggregate::{AggregatedSnapshot, RecordCounts};
use crate::core::artifact::ExportArtifact;
use crate::domain::errors::{CensusError, ErrorCategory, JobError};
use crate::domain::history::ExportHistoryEntry;
use crate::domain::ids::{JobId, SchoolId};
use crate::domain::period::ExportPeriod;
use crate::domain::profile::ComplianceProfile;
use crate::domain::records::SourceKind;
use crate::domain::Result;
use crate::log_job_transition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress reported once validation has passed and fetching starts
pub const PREPARING_START_PROGRESS: u8 = 5;

/// Lifecycle state of an export job
///
/// ```text
/// idle -> validating -> preparing -> prepared -> generating -> completed
///              \             \           \             \
///               `-------------`-----------`-------------`--> error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Validating,
    Preparing,
    Prepared,
    Generating,
    Completed,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Preparing => "preparing",
            Self::Prepared => "prepared",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// `completed` and `error` end the job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (*self, next),
            (Idle, Validating)
                | (Validating, Preparing)
                | (Preparing, Prepared)
                | (Prepared, Generating)
                | (Generating, Completed)
                | (Validating | Preparing | Prepared | Generating, Error)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress while preparing: `completed` of `total` sources fetched
///
/// Stays below 90 until aggregation has finished.
pub fn fetch_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return PREPARING_START_PROGRESS;
    }
    let completed = completed.min(total);
    let pct = usize::from(PREPARING_START_PROGRESS) + completed * 80 / total;
    u8::try_from(pct.min(89)).unwrap_or(89)
}

/// Point-in-time view of a job, as returned by `get_job_status`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: JobId,
    pub school_id: SchoolId,
    pub period: ExportPeriod,
    pub state: JobState,
    /// 0..=100, never decreases
    pub progress: u8,
    pub message: String,
    /// Present from `prepared` onwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_counts: Option<RecordCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    /// Set once `completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Set if the history entry for this job could not be written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What `begin_generating` found
pub enum GenerationInput {
    /// The job moved to `generating`; these are its snapshot and profile
    Ready(Box<AggregatedSnapshot>, ComplianceProfile),
    /// The job already produced this artifact
    AlreadyCompleted(ExportArtifact),
}

/// One export attempt for one school
///
/// The job owns its snapshot exclusively and drops it as soon as it reaches
/// a terminal state.
#[derive(Debug)]
pub struct ExportJob {
    id: JobId,
    school_id: SchoolId,
    period: ExportPeriod,
    state: JobState,
    progress: u8,
    message: String,
    profile: Option<ComplianceProfile>,
    snapshot: Option<AggregatedSnapshot>,
    record_counts: Option<RecordCounts>,
    artifact: Option<ExportArtifact>,
    error: Option<JobError>,
    cancel_requested: bool,
    history_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExportJob {
    pub fn new(school_id: SchoolId, period: ExportPeriod, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::generate(),
            school_id,
            period,
            state: JobState::Idle,
            progress: 0,
            message: "Export requested".to_string(),
            profile: None,
            snapshot: None,
            record_counts: None,
            artifact: None,
            error: None,
            cancel_requested: false,
            history_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn school_id(&self) -> &SchoolId {
        &self.school_id
    }

    pub fn period(&self) -> &ExportPeriod {
        &self.period
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    /// Move to `next`, rejecting transitions the state machine does not allow
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::IllegalState`] naming `operation`
    pub fn transition(
        &mut self,
        next: JobState,
        operation: &'static str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(self.illegal(operation));
        }
        log_job_transition!(self.id, self.state, next);
        self.state = next;
        self.updated_at = now;
        Ok(())
    }

    fn illegal(&self, operation: &'static str) -> CensusError {
        CensusError::IllegalState {
            job_id: self.id,
            state: self.state.to_string(),
            operation,
        }
    }

    /// Raise progress to `pct`; lower values are ignored
    pub fn advance_progress(&mut self, pct: u8, message: impl Into<String>, now: DateTime<Utc>) {
        self.progress = self.progress.max(pct.min(100));
        self.message = message.into();
        self.updated_at = now;
    }

    pub fn start_validation(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobState::Validating, "validate", now)?;
        self.message = "Validating compliance profile".to_string();
        Ok(())
    }

    pub fn start_preparing(&mut self, profile: ComplianceProfile, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobState::Preparing, "prepare", now)?;
        self.profile = Some(profile);
        self.advance_progress(
            PREPARING_START_PROGRESS,
            format!("Fetching source records (0/{})", SourceKind::ALL.len()),
            now,
        );
        Ok(())
    }

    /// Note that one more source finished fetching
    pub fn record_source_fetched(
        &mut self,
        source: SourceKind,
        completed: usize,
        total: usize,
        now: DateTime<Utc>,
    ) {
        if self.state != JobState::Preparing {
            return;
        }
        self.advance_progress(
            fetch_progress(completed, total),
            format!("Fetched {source} ({completed}/{total})"),
            now,
        );
        tracing::debug!(job_id = %self.id, source = %source, progress = self.progress, "Progress");
    }

    pub fn mark_cancel_requested(&mut self, now: DateTime<Utc>) {
        self.cancel_requested = true;
        self.message = "Cancelling".to_string();
        self.updated_at = now;
    }

    pub fn mark_prepared(&mut self, snapshot: AggregatedSnapshot, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobState::Prepared, "prepare", now)?;
        let counts = snapshot.counts();
        self.record_counts = Some(counts);
        self.snapshot = Some(snapshot);
        self.advance_progress(
            100,
            format!("Ready to generate: {} records", counts.total()),
            now,
        );
        Ok(())
    }

    /// Enter `generating`, handing out the snapshot and profile to serialize
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::IllegalState`] unless the job is `prepared` or
    /// already `completed`.
    pub fn begin_generating(&mut self, now: DateTime<Utc>) -> Result<GenerationInput> {
        if self.state == JobState::Completed {
            if let Some(artifact) = &self.artifact {
                return Ok(GenerationInput::AlreadyCompleted(artifact.clone()));
            }
        }
        if self.state != JobState::Prepared {
            return Err(self.illegal("generate"));
        }

        match (self.snapshot.take(), self.profile.clone()) {
            (Some(snapshot), Some(profile)) => {
                self.transition(JobState::Generating, "generate", now)?;
                self.message = "Generating artifact".to_string();
                Ok(GenerationInput::Ready(Box::new(snapshot), profile))
            }
            (snapshot, _) => {
                self.snapshot = snapshot;
                Err(CensusError::Other(format!(
                    "Job {} is prepared but holds no snapshot",
                    self.id
                )))
            }
        }
    }

    /// Finish successfully; returns the history entry to append
    pub fn complete(
        &mut self,
        artifact: ExportArtifact,
        now: DateTime<Utc>,
    ) -> Result<ExportHistoryEntry> {
        self.transition(JobState::Completed, "complete", now)?;
        self.message = format!("Export completed: {}", artifact.filename());
        self.profile = None;
        self.snapshot = None;
        let entry = ExportHistoryEntry::completed(
            self.id,
            self.school_id.clone(),
            self.period.label(),
            artifact.record_count(),
            artifact.fingerprint().to_string(),
            now,
        );
        self.artifact = Some(artifact);
        Ok(entry)
    }

    /// Fail the job; returns the history entry only if this call ended it
    pub fn fail(&mut self, error: JobError, now: DateTime<Utc>) -> Option<ExportHistoryEntry> {
        if self.state.is_terminal() {
            return None;
        }
        log_job_transition!(self.id, self.state, JobState::Error);
        tracing::warn!(
            job_id = %self.id,
            school_id = %self.school_id,
            kind = error.kind(),
            error = %error,
            "Export job failed"
        );

        self.state = JobState::Error;
        self.message = error.to_string();
        self.profile = None;
        self.snapshot = None;
        self.updated_at = now;
        let entry = ExportHistoryEntry::failed(
            self.id,
            self.school_id.clone(),
            self.period.label(),
            error.kind(),
            now,
        );
        self.error = Some(error);
        Some(entry)
    }

    pub fn set_history_error(&mut self, message: String) {
        self.history_error = Some(message);
    }

    pub fn status(&self) -> JobStatus {
        JobStatus {
            job_id: self.id,
            school_id: self.school_id.clone(),
            period: self.period.clone(),
            state: self.state,
            progress: self.progress,
            message: self.message.clone(),
            record_counts: self.record_counts,
            error: self.error.clone(),
            error_category: self.error.as_ref().map(JobError::category),
            fingerprint: self.artifact.as_ref().map(|a| a.fingerprint().to_string()),
            history_error: self.history_error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::{aggregate, GradingScale};
    use crate::core::artifact::ArtifactGenerator;
    use crate::core::fetch::SourceRecordSet;
    use crate::domain::history::HistoryStatus;
    use crate::domain::profile::{ComplianceProfileBuilder, SchoolCategory};
    use test_case::test_case;

    fn job() -> ExportJob {
        ExportJob::new(
            SchoolId::new("s1").unwrap(),
            ExportPeriod::new("2024", "T1").unwrap(),
            Utc::now(),
        )
    }

    fn profile() -> ComplianceProfile {
        ComplianceProfileBuilder::new(SchoolCategory::Combined)
            .institution_code("INST-1")
            .institution_name("Hill School")
            .district("North")
            .region("Upper")
            .contact_person("K. Boateng")
            .build()
    }

    fn snapshot() -> AggregatedSnapshot {
        aggregate(
            &SourceRecordSet {
                period: ExportPeriod::new("2024", "T1").unwrap(),
                students: Vec::new(),
                staff: Vec::new(),
                classes: Vec::new(),
                subjects: Vec::new(),
                attendance: Vec::new(),
                assessments: Vec::new(),
                fetched_at: Utc::now(),
            },
            &GradingScale::default(),
        )
    }

    fn prepared_job() -> ExportJob {
        let mut job = job();
        job.start_validation(Utc::now()).unwrap();
        job.start_preparing(profile(), Utc::now()).unwrap();
        job.mark_prepared(snapshot(), Utc::now()).unwrap();
        job
    }

    #[test_case(JobState::Idle, JobState::Validating, true)]
    #[test_case(JobState::Validating, JobState::Preparing, true)]
    #[test_case(JobState::Preparing, JobState::Prepared, true)]
    #[test_case(JobState::Prepared, JobState::Generating, true)]
    #[test_case(JobState::Generating, JobState::Completed, true)]
    #[test_case(JobState::Preparing, JobState::Error, true)]
    #[test_case(JobState::Idle, JobState::Error, false)]
    #[test_case(JobState::Idle, JobState::Preparing, false)]
    #[test_case(JobState::Prepared, JobState::Completed, false)]
    #[test_case(JobState::Completed, JobState::Error, false)]
    #[test_case(JobState::Error, JobState::Validating, false)]
    fn test_transition_table(from: JobState, to: JobState, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_fetch_progress_capped_below_ninety() {
        let values: Vec<u8> = (0..=6).map(|n| fetch_progress(n, 6)).collect();
        assert_eq!(values, vec![5, 18, 31, 45, 58, 71, 85]);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(fetch_progress(9, 6), 85);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut job = job();
        job.advance_progress(40, "a", Utc::now());
        job.advance_progress(20, "b", Utc::now());
        assert_eq!(job.progress(), 40);
        job.advance_progress(250, "c", Utc::now());
        assert_eq!(job.progress(), 100);
    }

    #[test]
    fn test_prepared_exposes_counts() {
        let job = prepared_job();
        let status = job.status();
        assert_eq!(status.state, JobState::Prepared);
        assert_eq!(status.progress, 100);
        assert_eq!(status.record_counts, Some(RecordCounts::default()));
    }

    #[test]
    fn test_generate_requires_prepared() {
        let mut job = job();
        let err = job.begin_generating(Utc::now()).err().unwrap();
        assert!(matches!(
            err,
            CensusError::IllegalState {
                operation: "generate",
                ..
            }
        ));
    }

    #[test]
    fn test_complete_and_regenerate_returns_same_artifact() {
        let mut job = prepared_job();
        let (snapshot, profile) = match job.begin_generating(Utc::now()).unwrap() {
            GenerationInput::Ready(snapshot, profile) => (snapshot, profile),
            GenerationInput::AlreadyCompleted(_) => panic!("not completed yet"),
        };
        let artifact = ArtifactGenerator::default()
            .generate(&snapshot, &profile)
            .unwrap();
        let entry = job.complete(artifact.clone(), Utc::now()).unwrap();
        assert_eq!(entry.status, HistoryStatus::Completed);
        assert_eq!(entry.fingerprint.as_deref(), Some(artifact.fingerprint()));

        match job.begin_generating(Utc::now()).unwrap() {
            GenerationInput::AlreadyCompleted(again) => assert_eq!(again, artifact),
            GenerationInput::Ready(..) => panic!("expected the stored artifact"),
        }
    }

    #[test]
    fn test_fail_only_once() {
        let mut job = job();
        job.start_validation(Utc::now()).unwrap();
        let entry = job.fail(JobError::Cancelled, Utc::now()).unwrap();
        assert_eq!(entry.status, HistoryStatus::Failed);
        assert_eq!(entry.record_count, 0);
        assert_eq!(entry.error_kind.as_deref(), Some("cancelled"));

        assert!(job.fail(JobError::Timeout { limit_secs: 1 }, Utc::now()).is_none());
        assert_eq!(job.error(), Some(&JobError::Cancelled));
        assert_eq!(job.status().error_category, Some(ErrorCategory::Cancelled));
    }

    #[test]
    fn test_fail_drops_snapshot() {
        let mut job = prepared_job();
        job.fail(JobError::Cancelled, Utc::now()).unwrap();
        assert!(job.snapshot.is_none());
        assert!(job.begin_generating(Utc::now()).is_err());
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_value(prepared_job().status()).unwrap();
        assert_eq!(json["state"], "prepared");
        assert!(json.get("recordCounts").is_some());
        assert!(json.get("error").is_none());
    }
}
