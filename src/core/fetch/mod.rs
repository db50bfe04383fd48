//! Concurrent source fetching
//!
//! [`SourceFetcher::fetch_all`] reads the six record collections of a school
//! at once. Each read gets its own timeout and retry budget; the join fails
//! as soon as any source runs out of attempts, and no partial record set is
//! ever returned.

pub mod fetcher;
pub mod retry;

pub use fetcher::{FetchProgress, SourceFetcher, SourceRecordSet};
pub use retry::FetchPolicy;

use crate::domain::errors::{JobError, SourceError};
use crate::domain::records::SourceKind;
use thiserror::Error;

/// Why `fetch_all` produced no record set
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// A source failed on every attempt
    #[error("Source {source_kind} failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        source_kind: SourceKind,
        attempts: u32,
        last_error: SourceError,
    },

    /// The cancellation signal was raised before every source finished
    #[error("Fetch cancelled")]
    Cancelled,
}

impl From<FetchError> for JobError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Exhausted {
                source_kind,
                attempts,
                last_error,
            } => JobError::Fetch {
                failed_source: source_kind,
                attempts,
                message: last_error.to_string(),
            },
            FetchError::Cancelled => JobError::Cancelled,
        }
    }
}
