//! Export jobs and the manager that runs them
//!
//! - [`job`] - The per-job state machine and its status snapshot
//! - [`manager`] - Single-flight job table, preparation tasks, and the
//!   `request_export` / `get_job_status` / `generate_artifact` / `cancel_job`
//!   operations

pub mod job;
pub mod manager;

pub use job::{fetch_progress, ExportJob, GenerationInput, JobState, JobStatus};
pub use manager::{ExportManager, ExportSettings};
