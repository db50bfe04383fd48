// Census - School Compliance Data Export
// Copyright (c) 2025 Census Contributors
// Licensed under the MIT License

//! # Census - School Compliance Data Export
//!
//! Census produces a regulator-compatible snapshot of a school's records for
//! one academic period: students, staff, classes and subjects, a per-day
//! attendance summary and graded assessment results, packaged as a
//! deterministic JSON document with a SHA-256 fingerprint.
//!
//! ## Overview
//!
//! An export runs as a job through a fixed state machine:
//!
//! ```text
//! idle -> validating -> preparing -> prepared -> generating -> completed
//!              \             \           \            \
//!               +-------------+-----------+------------+--> error
//! ```
//!
//! - **Validating** loads the school's compliance profile and checks every
//!   required field before anything is fetched
//! - **Preparing** fetches the six record collections concurrently, each
//!   with its own timeout and retries, and aggregates them
//! - **Generating** serializes the snapshot once the caller asks for it
//!
//! At most one job per school is in flight. Each job that finishes, for any
//! reason, leaves exactly one entry in the export history.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Validation, fetching, aggregation, artifact generation, jobs
//! - [`adapters`] - Record sources and history stores (memory, filesystem, HTTP)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use census::adapters::create_collaborators;
//! use census::config::load_config;
//! use census::core::export::{ExportManager, ExportSettings, JobState};
//! use census::domain::{ExportPeriod, SchoolId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("census.toml")?;
//!     let manager = ExportManager::new(
//!         create_collaborators(&config)?,
//!         ExportSettings::from_config(&config)?,
//!     );
//!
//!     let job_id = manager
//!         .request_export(SchoolId::new("s-001")?, ExportPeriod::new("2024", "T1")?)
//!         .await?;
//!     let status = manager
//!         .wait_for(job_id, |s| s.state == JobState::Prepared || s.state.is_terminal())
//!         .await?;
//!
//!     if status.state == JobState::Prepared {
//!         let artifact = manager.generate_artifact(job_id).await?;
//!         std::fs::write(artifact.filename(), artifact.payload())?;
//!         println!("{} sha256:{}", artifact.filename(), artifact.fingerprint());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::CensusError`]. A job that ends in
//! `error` carries a [`domain::JobError`] whose
//! [`category`](domain::JobError::category) tells the caller whether to fix
//! the profile, retry later, or report a system problem.
//!
//! ## Logging
//!
//! Census uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(school_id = "s-001", "Export requested");
//! warn!(source = "assessments", attempt = 2, "Retrying source fetch");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
