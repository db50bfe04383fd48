//! Per-source timeout and fixed-backoff retry

use super::FetchError;
use crate::adapters::traits::SourceResult;
use crate::config::FetchConfig;
use crate::domain::errors::SourceError;
use crate::domain::records::SourceKind;
use crate::log_retry_attempt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Timeout and retry budget applied to each source independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Limit for one attempt
    pub timeout: Duration,
    /// Attempts after the first failure
    pub max_retries: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl FetchPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Outcome of a source read that was not cut short by an exhausted budget
pub(crate) struct Fetched<T> {
    pub value: T,
    pub attempts: u32,
}

/// Run `operation` until it succeeds or the policy is exhausted
///
/// The cancellation signal is checked before every attempt and while waiting
/// out the backoff; an attempt already in flight is always allowed to finish.
/// Returns `Ok(None)` when cancelled.
pub(crate) async fn fetch_with_retry<T, F, Fut>(
    source: SourceKind,
    policy: &FetchPolicy,
    cancel: &mut watch::Receiver<bool>,
    operation: F,
) -> Result<Option<Fetched<T>>, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = SourceResult<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        if *cancel.borrow() {
            return Ok(None);
        }

        attempt += 1;
        let outcome = match tokio::time::timeout(policy.timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(format!(
                "{source} did not answer within {}ms",
                policy.timeout.as_millis()
            ))),
        };

        match outcome {
            Ok(value) => {
                return Ok(Some(Fetched {
                    value,
                    attempts: attempt,
                }))
            }
            Err(e) => {
                if attempt >= max_attempts {
                    return Err(FetchError::Exhausted {
                        source_kind: source,
                        attempts: attempt,
                        last_error: e,
                    });
                }

                log_retry_attempt!(source, attempt + 1, max_attempts, e);

                tokio::select! {
                    _ = tokio::time::sleep(policy.backoff) => {}
                    _ = cancelled(cancel) => return Ok(None),
                }
            }
        }
    }
}

/// Resolves once the flag is raised; never resolves if the sender is gone
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
