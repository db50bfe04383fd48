//! Logging and observability
//!
//! Structured logging through `tracing`, plus a handful of macros that keep
//! the field names of recurring pipeline events consistent.
//!
//! # Example
//!
//! ```no_run
//! use census::logging::init_logging;
//! use census::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(school_id = "s-001", "Export requested");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a job state transition
///
/// # Example
///
/// ```no_run
/// use census::log_job_transition;
/// use census::domain::ids::JobId;
///
/// let job_id = JobId::generate();
/// log_job_transition!(&job_id, "validating", "preparing");
/// ```
#[macro_export]
macro_rules! log_job_transition {
    ($job_id:expr, $from:expr, $to:expr) => {
        tracing::info!(
            job_id = %$job_id,
            from = %$from,
            to = %$to,
            "Job state changed"
        );
    };
}

/// Log a completed source fetch
///
/// # Example
///
/// ```no_run
/// use census::log_source_fetched;
///
/// log_source_fetched!("students", 120, 1);
/// ```
#[macro_export]
macro_rules! log_source_fetched {
    ($source:expr, $count:expr, $attempts:expr) => {
        tracing::debug!(
            source = %$source,
            records = $count,
            attempts = $attempts,
            "Source fetched"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use census::log_retry_attempt;
///
/// log_retry_attempt!("staff", 2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($source:expr, $attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            source = %$source,
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying source fetch"
        );
    };
}
