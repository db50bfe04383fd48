//! Export manager - owns every export job and the single-flight table
//!
//! The manager is the operation surface of the pipeline: `request_export`,
//! `get_job_status`, `generate_artifact`, `cancel_job` and
//! `acknowledge_job`. Each job's preparation runs as its own tokio task.

use super::job::{ExportJob, GenerationInput, JobState, JobStatus};
use crate::adapters::factory::Collaborators;
use crate::config::CensusConfig;
use crate::core::aggregate::{aggregate, AggregatedSnapshot, GradingScale};
use crate::core::artifact::{ArtifactGenerator, ExportArtifact};
use crate::core::clock::{Clock, SystemClock};
use crate::core::fetch::retry::cancelled;
use crate::core::fetch::{FetchPolicy, FetchProgress, SourceFetcher};
use crate::core::validation::{validate, ValidationResult};
use crate::domain::errors::{CensusError, JobError, SourceError};
use crate::domain::history::ExportHistoryEntry;
use crate::domain::ids::{JobId, SchoolId};
use crate::domain::period::ExportPeriod;
use crate::domain::profile::ComplianceProfile;
use crate::domain::records::SourceKind;
use crate::domain::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Tunables of the pipeline
#[derive(Clone)]
pub struct ExportSettings {
    pub fetch: FetchPolicy,
    pub grading: GradingScale,
    /// Limit on the preparing stage of one job; the profile lookup has its own timeout
    pub job_timeout: Duration,
    pub clock: Arc<dyn Clock>,
}

impl ExportSettings {
    /// Settings described by a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the grading scale is invalid
    pub fn from_config(config: &CensusConfig) -> Result<Self> {
        Ok(Self {
            fetch: FetchPolicy::from_config(&config.fetch),
            grading: config.grading.scale().map_err(CensusError::Configuration)?,
            job_timeout: config.job.overall_timeout(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fetch: FetchPolicy::default(),
            grading: GradingScale::default(),
            job_timeout: Duration::from_secs(300),
            clock: Arc::new(SystemClock),
        }
    }
}

struct JobHandle {
    job: Mutex<ExportJob>,
    cancel_tx: watch::Sender<bool>,
    status_tx: watch::Sender<JobStatus>,
}

impl JobHandle {
    fn new(job: ExportJob) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        let (status_tx, _) = watch::channel(job.status());
        Self {
            job: Mutex::new(job),
            cancel_tx,
            status_tx,
        }
    }

    fn read<R>(&self, f: impl FnOnce(&ExportJob) -> R) -> R {
        f(&lock(&self.job))
    }

    /// Mutate the job and publish the new status
    ///
    /// Terminal states are published by [`ExportManager::settle`] once their
    /// history entry is written and the school slot released.
    fn update<R>(&self, f: impl FnOnce(&mut ExportJob) -> R) -> R {
        let mut job = lock(&self.job);
        let result = f(&mut job);
        if !job.state().is_terminal() {
            self.status_tx.send_replace(job.status());
        }
        result
    }

    fn publish(&self) {
        let job = lock(&self.job);
        self.status_tx.send_replace(job.status());
    }
}

struct JobProgress<'a> {
    handle: &'a JobHandle,
    clock: &'a dyn Clock,
}

impl FetchProgress for JobProgress<'_> {
    fn source_completed(&self, source: SourceKind, completed: usize, total: usize) {
        let now = self.clock.now();
        self.handle
            .update(|job| job.record_source_fetched(source, completed, total, now));
    }
}

#[derive(Default)]
struct JobTable {
    jobs: HashMap<JobId, Arc<JobHandle>>,
    /// School to its non-terminal job
    active: HashMap<SchoolId, JobId>,
}

struct Shared {
    collaborators: Collaborators,
    fetcher: SourceFetcher,
    grading: GradingScale,
    generator: ArtifactGenerator,
    clock: Arc<dyn Clock>,
    job_timeout: Duration,
    table: Mutex<JobTable>,
}

/// Runs compliance exports
///
/// Cloning is cheap and every clone shares the same job table.
///
/// # Example
///
/// ```no_run
/// use census::adapters::memory::{InMemoryHistoryStore, InMemoryProfileStore, InMemoryRecordSource};
/// use census::adapters::Collaborators;
/// use census::core::export::{ExportManager, ExportSettings, JobState};
/// use census::domain::{ExportPeriod, SchoolId};
/// use std::sync::Arc;
///
/// # async fn example() -> census::domain::Result<()> {
/// let collaborators = Collaborators {
///     profiles: Arc::new(InMemoryProfileStore::new()),
///     records: Arc::new(InMemoryRecordSource::new()),
///     history: Arc::new(InMemoryHistoryStore::new()),
/// };
/// let manager = ExportManager::new(collaborators, ExportSettings::default());
///
/// let school = SchoolId::new("s-001").expect("valid school id");
/// let period = ExportPeriod::new("2024", "T1").expect("valid period");
/// let job_id = manager.request_export(school, period).await?;
/// let status = manager
///     .wait_for(job_id, |s| s.state == JobState::Prepared || s.state.is_terminal())
///     .await?;
/// if status.state == JobState::Prepared {
///     let artifact = manager.generate_artifact(job_id).await?;
///     println!("{} ({})", artifact.filename(), artifact.fingerprint());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ExportManager {
    shared: Arc<Shared>,
}

impl ExportManager {
    pub fn new(collaborators: Collaborators, settings: ExportSettings) -> Self {
        let fetcher = SourceFetcher::new(collaborators.records.clone(), settings.fetch);
        Self {
            shared: Arc::new(Shared {
                collaborators,
                fetcher,
                grading: settings.grading,
                generator: ArtifactGenerator::new(settings.clock.clone()),
                clock: settings.clock,
                job_timeout: settings.job_timeout,
                table: Mutex::new(JobTable::default()),
            }),
        }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.shared.clock.now()
    }

    fn handle(&self, job_id: JobId) -> Result<Arc<JobHandle>> {
        lock(&self.shared.table)
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or(CensusError::JobNotFound(job_id))
    }

    /// Start an export for a school
    ///
    /// The compliance profile is loaded and validated before this returns;
    /// fetching then continues in the background. The job runs as its own
    /// task from the moment the school is claimed, so dropping this future
    /// only stops the wait and the job still settles.
    ///
    /// # Errors
    ///
    /// - [`CensusError::AlreadyInProgress`] if the school has a non-terminal job
    /// - [`CensusError::Job`] with [`JobError::Validation`] listing every
    ///   missing field, a profile lookup failure, or [`JobError::Cancelled`];
    ///   the failed job stays visible through `get_job_status`
    pub async fn request_export(&self, school_id: SchoolId, period: ExportPeriod) -> Result<JobId> {
        let handle = {
            let mut table = lock(&self.shared.table);
            if let Some(existing) = table.active.get(&school_id) {
                tracing::warn!(
                    school_id = %school_id,
                    job_id = %existing,
                    "Export already in progress"
                );
                return Err(CensusError::AlreadyInProgress {
                    school_id,
                    job_id: *existing,
                });
            }

            let now = self.now();
            let mut job = ExportJob::new(school_id.clone(), period, now);
            job.start_validation(now)?;
            let job_id = job.id();
            let handle = Arc::new(JobHandle::new(job));
            table.jobs.insert(job_id, handle.clone());
            table.active.insert(school_id.clone(), job_id);
            handle
        };
        let job_id = handle.read(ExportJob::id);

        tracing::info!(
            job_id = %job_id,
            school_id = %school_id,
            period = %handle.read(|job| job.period().label()),
            "Export requested"
        );

        let mut status_rx = handle.status_tx.subscribe();
        let manager = self.clone();
        tokio::spawn(async move { manager.run_job(handle).await });

        let (state, error) = {
            let status = status_rx
                .wait_for(|status| status.state != JobState::Validating)
                .await
                .map_err(|_| {
                    CensusError::Other(format!("Job {job_id} was dropped during validation"))
                })?;
            (status.state, status.error.clone())
        };

        match (state, error) {
            (JobState::Error, Some(error)) => Err(error.into()),
            _ => Ok(job_id),
        }
    }

    async fn run_job(&self, handle: Arc<JobHandle>) {
        let profile = match self.load_and_validate(&handle).await {
            Ok(profile) => profile,
            Err(error) => {
                self.finish_failed(&handle, error).await;
                return;
            }
        };

        let now = self.now();
        let started = handle.update(|job| {
            if job.cancel_requested() {
                Ok(false)
            } else {
                job.start_preparing(profile, now).map(|()| true)
            }
        });

        match started {
            Ok(true) => self.run_preparation(handle).await,
            Ok(false) => {
                self.finish_failed(&handle, JobError::Cancelled).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Validation finished after the job had ended");
            }
        }
    }

    async fn load_and_validate(
        &self,
        handle: &JobHandle,
    ) -> std::result::Result<ComplianceProfile, JobError> {
        let school_id = handle.read(|job| job.school_id().clone());
        let mut cancel = handle.cancel_tx.subscribe();

        let profile = tokio::select! {
            loaded = self.load_profile(&school_id) => loaded?,
            () = cancelled(&mut cancel) => return Err(JobError::Cancelled),
        };

        match validate(&profile) {
            ValidationResult::Valid => Ok(profile),
            ValidationResult::Invalid(errors) => Err(JobError::Validation { errors }),
        }
    }

    async fn load_profile(&self, school_id: &SchoolId) -> std::result::Result<ComplianceProfile, JobError> {
        let limit = self.shared.fetcher.policy().timeout;
        let lookup = self
            .shared
            .collaborators
            .profiles
            .get_compliance_profile(school_id);

        match tokio::time::timeout(limit, lookup).await {
            Ok(Ok(profile)) => Ok(profile),
            Ok(Err(SourceError::NotFound(_))) => Err(JobError::ProfileNotFound {
                school_id: school_id.to_string(),
            }),
            Ok(Err(e)) => Err(JobError::ProfileUnavailable {
                school_id: school_id.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(JobError::ProfileUnavailable {
                school_id: school_id.to_string(),
                message: format!("no answer within {}ms", limit.as_millis()),
            }),
        }
    }

    async fn run_preparation(&self, handle: Arc<JobHandle>) {
        let limit = self.shared.job_timeout;
        let outcome = match tokio::time::timeout(limit, self.prepare(&handle)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                handle.cancel_tx.send_replace(true);
                Err(JobError::Timeout {
                    limit_secs: limit.as_secs(),
                })
            }
        };

        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.finish_failed(&handle, error).await;
                return;
            }
        };

        let now = self.now();
        let prepared = handle.update(|job| {
            if job.cancel_requested() {
                Ok(false)
            } else {
                job.mark_prepared(snapshot, now).map(|()| true)
            }
        });

        match prepared {
            Ok(true) => {
                let (job_id, counts) = handle.read(|job| (job.id(), job.status().record_counts));
                tracing::info!(
                    job_id = %job_id,
                    records = counts.map_or(0, |c| c.total()),
                    "Export prepared"
                );
            }
            Ok(false) => {
                self.finish_failed(&handle, JobError::Cancelled).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Preparation finished after the job had ended");
            }
        }
    }

    async fn prepare(&self, handle: &JobHandle) -> std::result::Result<AggregatedSnapshot, JobError> {
        let (school_id, period) = handle.read(|job| (job.school_id().clone(), job.period().clone()));
        let cancel = handle.cancel_tx.subscribe();
        let progress = JobProgress {
            handle,
            clock: self.shared.clock.as_ref(),
        };

        let set = self
            .shared
            .fetcher
            .fetch_all(&school_id, &period, &cancel, &progress)
            .await?;

        if *cancel.borrow() {
            return Err(JobError::Cancelled);
        }

        Ok(aggregate(&set, &self.shared.grading))
    }

    /// Fail a job and settle it; returns the error the job ended with
    async fn finish_failed(&self, handle: &JobHandle, error: JobError) -> JobError {
        let now = self.now();
        let entry = handle.update(|job| job.fail(error.clone(), now));
        if let Some(entry) = entry {
            self.settle(handle, entry).await;
        }
        handle.read(|job| job.error().cloned()).unwrap_or(error)
    }

    /// Record a terminal job: append history, free the school, publish status
    async fn settle(&self, handle: &JobHandle, entry: ExportHistoryEntry) {
        if let Err(e) = self
            .shared
            .collaborators
            .history
            .append_export_history(&entry)
            .await
        {
            tracing::error!(
                job_id = %entry.job_id,
                school_id = %entry.school_id,
                error = %e,
                "Failed to record export history"
            );
            handle.update(|job| job.set_history_error(e.to_string()));
        } else {
            tracing::info!(
                job_id = %entry.job_id,
                school_id = %entry.school_id,
                status = ?entry.status,
                record_count = entry.record_count,
                "Export history recorded"
            );
        }

        {
            let mut table = lock(&self.shared.table);
            if table.active.get(&entry.school_id) == Some(&entry.job_id) {
                table.active.remove(&entry.school_id);
            }
        }

        handle.publish();
    }

    /// Current status of a job
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::JobNotFound`] for unknown or acknowledged jobs
    pub fn get_job_status(&self, job_id: JobId) -> Result<JobStatus> {
        Ok(self.handle(job_id)?.status_tx.borrow().clone())
    }

    /// Subscribe to status changes of a job
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::JobNotFound`] for unknown or acknowledged jobs
    pub fn watch_job(&self, job_id: JobId) -> Result<watch::Receiver<JobStatus>> {
        Ok(self.handle(job_id)?.status_tx.subscribe())
    }

    /// Wait until the job's status satisfies `condition`
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::JobNotFound`] for unknown jobs, or an error if
    /// the job is dropped while waiting.
    pub async fn wait_for(
        &self,
        job_id: JobId,
        mut condition: impl FnMut(&JobStatus) -> bool,
    ) -> Result<JobStatus> {
        let mut rx = self.watch_job(job_id)?;
        let status = rx
            .wait_for(|status| condition(status))
            .await
            .map_err(|_| CensusError::Other(format!("Job {job_id} was dropped while waiting")))?;
        Ok(status.clone())
    }

    /// Serialize a prepared job into its artifact
    ///
    /// Calling this again on a completed job returns the same artifact.
    /// Generation and the history append run as their own task, so the job
    /// settles even if this future is dropped.
    ///
    /// # Errors
    ///
    /// - [`CensusError::IllegalState`] unless the job is `prepared` or `completed`
    /// - [`CensusError::Job`] with [`JobError::Serialization`] naming the field
    ///   that could not be represented, or [`JobError::Cancelled`]
    pub async fn generate_artifact(&self, job_id: JobId) -> Result<ExportArtifact> {
        let handle = self.handle(job_id)?;
        let now = self.now();

        let (snapshot, profile) = match handle.update(|job| job.begin_generating(now))? {
            GenerationInput::Ready(snapshot, profile) => (snapshot, profile),
            GenerationInput::AlreadyCompleted(artifact) => return Ok(artifact),
        };

        let manager = self.clone();
        let task =
            tokio::spawn(async move { manager.run_generation(handle, snapshot, profile).await });
        task.await.map_err(|e| {
            CensusError::Other(format!("Generation task for job {job_id} failed: {e}"))
        })?
    }

    async fn run_generation(
        &self,
        handle: Arc<JobHandle>,
        snapshot: Box<AggregatedSnapshot>,
        profile: ComplianceProfile,
    ) -> Result<ExportArtifact> {
        let generator = self.shared.generator.clone();
        let generated = tokio::task::spawn_blocking(move || generator.generate(&snapshot, &profile))
            .await
            .unwrap_or_else(|e| {
                Err(JobError::Serialization {
                    path: "$".to_string(),
                    message: format!("generation task failed: {e}"),
                })
            });

        let artifact = match generated {
            Ok(artifact) => artifact,
            Err(error) => return Err(self.finish_failed(&handle, error).await.into()),
        };

        if handle.read(ExportJob::cancel_requested) {
            return Err(self.finish_failed(&handle, JobError::Cancelled).await.into());
        }

        let now = self.now();
        let entry = handle.update(|job| job.complete(artifact.clone(), now))?;
        tracing::info!(
            job_id = %entry.job_id,
            filename = %artifact.filename(),
            fingerprint = %artifact.fingerprint(),
            records = artifact.record_count(),
            "Artifact generated"
        );
        self.settle(&handle, entry).await;

        Ok(artifact)
    }

    /// Cancel a job
    ///
    /// Running stages stop at their next checkpoint: a pending profile lookup
    /// is abandoned, fetches stop retrying, and a generated artifact is
    /// discarded. A prepared job fails immediately. Cancelling a finished job
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::JobNotFound`] for unknown jobs
    pub async fn cancel_job(&self, job_id: JobId) -> Result<()> {
        let handle = self.handle(job_id)?;
        let now = self.now();

        enum Action {
            Nothing,
            Signal,
            Settle(ExportHistoryEntry),
        }

        let action = handle.update(|job| match job.state() {
            JobState::Completed | JobState::Error => Action::Nothing,
            JobState::Prepared => job
                .fail(JobError::Cancelled, now)
                .map_or(Action::Nothing, Action::Settle),
            _ => {
                job.mark_cancel_requested(now);
                Action::Signal
            }
        });

        match action {
            Action::Nothing => {
                tracing::debug!(job_id = %job_id, "Cancel ignored for finished job");
            }
            Action::Signal => {
                tracing::info!(job_id = %job_id, "Cancellation requested");
                handle.cancel_tx.send_replace(true);
            }
            Action::Settle(entry) => self.settle(&handle, entry).await,
        }
        Ok(())
    }

    /// Forget a finished job
    ///
    /// # Errors
    ///
    /// - [`CensusError::JobNotFound`] for unknown jobs
    /// - [`CensusError::IllegalState`] if the job has not finished
    pub fn acknowledge_job(&self, job_id: JobId) -> Result<()> {
        let mut table = lock(&self.shared.table);
        let handle = table
            .jobs
            .get(&job_id)
            .ok_or(CensusError::JobNotFound(job_id))?;

        let state = handle.read(ExportJob::state);
        if !state.is_terminal() {
            return Err(CensusError::IllegalState {
                job_id,
                state: state.to_string(),
                operation: "acknowledge",
            });
        }

        table.jobs.remove(&job_id);
        tracing::debug!(job_id = %job_id, "Job acknowledged");
        Ok(())
    }

    /// Id of the school's non-terminal job, if any
    pub fn active_job(&self, school_id: &SchoolId) -> Option<JobId> {
        lock(&self.shared.table).active.get(school_id).copied()
    }
}
