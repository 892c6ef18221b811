//! Retry loop for idempotent collaborator calls

use crate::config::RetryPolicy;
use recon_store::{SourceError, StoreError};
use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Errors that may clear up if the call is repeated
pub(crate) trait Transient: Display {
    fn is_transient(&self) -> bool;
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        SourceError::is_transient(self)
    }
}

/// Last error of a call that did not succeed
#[derive(Debug)]
pub(crate) struct Exhausted<E> {
    pub(crate) error: E,
    pub(crate) attempts: u32,
}

/// Run `call` until it succeeds, fails permanently, or the policy runs out
///
/// Only for idempotent calls: a transient failure is answered by calling again.
pub(crate) async fn retry_transient<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut call: F,
) -> Result<T, Exhausted<E>>
where
    E: Transient,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let wait = policy.backoff(attempt);
                warn!(
                    operation,
                    attempt,
                    wait_ms = wait.as_millis(),
                    error = %error,
                    "transient failure, retrying with backoff"
                );
                tokio::time::sleep(wait).await;
            }
            Err(error) => {
                return Err(Exhausted {
                    error,
                    attempts: attempt,
                })
            }
        }
    }
}
