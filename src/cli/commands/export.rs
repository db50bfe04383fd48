//! Export command implementation
//!
//! This module implements the `export` command: it prepares one school's
//! compliance export for a period, generates the artifact and writes it to
//! the configured output directory.

use crate::adapters::create_collaborators;
use crate::config::load_config;
use crate::core::artifact::ExportArtifact;
use crate::core::export::{ExportManager, ExportSettings, JobState, JobStatus};
use crate::domain::errors::{CensusError, ErrorCategory, JobError};
use crate::domain::ids::{JobId, SchoolId};
use crate::domain::period::ExportPeriod;
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// School to export
    #[arg(long)]
    pub school: String,

    /// Academic year, e.g. 2024
    #[arg(long)]
    pub year: String,

    /// Term within the academic year, e.g. T1
    #[arg(long)]
    pub term: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Exit code for a job that ended in error
pub fn exit_code_for(error: &JobError) -> i32 {
    match error.category() {
        ErrorCategory::FixProfile => 2,
        ErrorCategory::RetryLater => 4,
        ErrorCategory::Cancelled => 130,
        ErrorCategory::SystemProblem => 5,
    }
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration could not be loaded");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let (school_id, period) = match self.target() {
            Ok(target) => target,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        if !self.yes {
            println!("Export Configuration:");
            println!("  School: {school_id}");
            println!("  Period: {period}");
            println!("  Output: {}", config.output.directory);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        let settings = match ExportSettings::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };
        let collaborators = match create_collaborators(&config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create collaborators");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4);
            }
        };
        let manager = ExportManager::new(collaborators, settings);

        println!("🚀 Starting export...");
        let job_id = match manager.request_export(school_id, period).await {
            Ok(id) => id,
            Err(CensusError::AlreadyInProgress { job_id, .. }) => {
                eprintln!("An export is already running for this school (job {job_id})");
                return Ok(3);
            }
            Err(CensusError::Job(error)) => {
                report_job_error(&error);
                return Ok(exit_code_for(&error));
            }
            Err(e) => return Err(e.into()),
        };

        let status = wait_until_prepared(&manager, job_id, shutdown_signal).await?;
        if let Some(error) = &status.error {
            report_job_error(error);
            return Ok(exit_code_for(error));
        }

        if let Some(counts) = status.record_counts {
            println!();
            println!("📊 Prepared Records:");
            println!("  Students: {}", counts.students);
            println!("  Staff: {}", counts.staff);
            println!("  Classes: {}", counts.classes);
            println!("  Subjects: {}", counts.subjects);
            println!("  Attendance Summary: {}", counts.attendance_summary);
            println!("  Assessment Summary: {}", counts.assessment_summary);
            println!("  Total: {}", counts.total());
            println!();
        }

        let artifact = match manager.generate_artifact(job_id).await {
            Ok(a) => a,
            Err(CensusError::Job(error)) => {
                report_job_error(&error);
                return Ok(exit_code_for(&error));
            }
            Err(e) => return Err(e.into()),
        };

        let path = match write_artifact(Path::new(&config.output.directory), &artifact).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to write artifact");
                eprintln!("Failed to write artifact: {e}");
                return Ok(5);
            }
        };

        if let Some(history_error) = manager.get_job_status(job_id)?.history_error {
            println!("⚠️  Export history could not be recorded: {history_error}");
        }

        println!("✅ Export completed successfully!");
        println!("  File: {}", path.display());
        println!("  Records: {}", artifact.record_count());
        println!("  SHA-256: {}", artifact.fingerprint());
        Ok(0)
    }

    fn target(&self) -> Result<(SchoolId, ExportPeriod), String> {
        let school = SchoolId::new(self.school.as_str()).map_err(|e| format!("Invalid --school: {e}"))?;
        let period = ExportPeriod::new(self.year.as_str(), self.term.as_str())
            .map_err(|e| format!("Invalid period: {e}"))?;
        Ok((school, period))
    }
}

/// Wait for the job to be prepared or to end; a shutdown signal cancels it
async fn wait_until_prepared(
    manager: &ExportManager,
    job_id: JobId,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<JobStatus> {
    let settled = |s: &JobStatus| s.state == JobState::Prepared || s.state.is_terminal();

    let shutdown_requested = async move {
        if shutdown.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        status = manager.wait_for(job_id, settled) => Ok(status?),
        () = shutdown_requested => {
            println!();
            println!("⚠️  Shutdown signal received, cancelling export...");
            manager.cancel_job(job_id).await?;
            Ok(manager.wait_for(job_id, |s| s.state.is_terminal()).await?)
        }
    }
}

fn report_job_error(error: &JobError) {
    eprintln!("❌ Export failed: {error}");
    if let JobError::Validation { errors } = error {
        for field in errors {
            eprintln!("   - {field}");
        }
    }
}

async fn write_artifact(directory: &Path, artifact: &ExportArtifact) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(directory).await?;
    let path = directory.join(artifact.filename());
    tokio::fs::write(&path, artifact.payload()).await?;
    tracing::info!(path = %path.display(), "Artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::FieldError;
    use crate::domain::records::SourceKind;
    use test_case::test_case;

    #[test_case(JobError::Validation { errors: vec![FieldError::new("district", "is required")] } => 2)]
    #[test_case(JobError::ProfileNotFound { school_id: "s".into() } => 2)]
    #[test_case(JobError::Fetch { failed_source: SourceKind::Assessments, attempts: 3, message: "t".into() } => 4)]
    #[test_case(JobError::Timeout { limit_secs: 300 } => 4)]
    #[test_case(JobError::Cancelled => 130)]
    #[test_case(JobError::Serialization { path: "p".into(), message: "m".into() } => 5)]
    fn test_exit_codes(error: JobError) -> i32 {
        exit_code_for(&error)
    }

    #[test]
    fn test_target_rejects_blank_school() {
        let args = ExportArgs {
            school: "  ".to_string(),
            year: "2024".to_string(),
            term: "T1".to_string(),
            yes: true,
        };
        assert!(args.target().is_err());
    }

    #[test]
    fn test_target_rejects_school_outside_data_dir() {
        let args = ExportArgs {
            school: "../other".to_string(),
            year: "2024".to_string(),
            term: "T1".to_string(),
            yes: true,
        };
        let err = args.target().unwrap_err();
        assert!(err.contains("single path segment"));
    }
}
