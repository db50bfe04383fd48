//! Core business logic for Census.
//!
//! # Modules
//!
//! - [`validation`] - Compliance profile completeness checks
//! - [`fetch`] - Concurrent source fetching with timeouts and retries
//! - [`aggregate`] - Attendance and assessment summaries, normalized records
//! - [`artifact`] - Deterministic compliance document and its fingerprint
//! - [`export`] - Export job state machine and manager
//! - [`clock`] - Time source shared by jobs and artifacts
//!
//! # Export Workflow
//!
//! 1. **Validate**: Load the school's compliance profile and check required fields
//! 2. **Fetch**: Read all six record collections concurrently
//! 3. **Aggregate**: Summarize attendance and grade assessments
//! 4. **Generate**: Serialize the snapshot and fingerprint it
//! 5. **Record**: Append one history entry per finished job
//!
//! # Example
//!
//! ```rust,no_run
//! use census::adapters::create_collaborators;
//! use census::config::load_config;
//! use census::core::export::{ExportManager, ExportSettings, JobState};
//! use census::domain::{ExportPeriod, SchoolId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("census.toml")?;
//! let manager = ExportManager::new(
//!     create_collaborators(&config)?,
//!     ExportSettings::from_config(&config)?,
//! );
//!
//! let job_id = manager
//!     .request_export(SchoolId::new("s-001")?, ExportPeriod::new("2024", "T1")?)
//!     .await?;
//! let status = manager
//!     .wait_for(job_id, |s| s.state == JobState::Prepared || s.state.is_terminal())
//!     .await?;
//! println!("Prepared {:?}", status.record_counts);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod artifact;
pub mod clock;
pub mod export;
pub mod fetch;
pub mod validation;
