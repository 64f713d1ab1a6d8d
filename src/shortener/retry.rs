use std::future::Future;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: usize, last: E },
    /// An attempt failed with an error that must not be retried
    #[error("attempt failed with a non-retryable error")]
    Aborted(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Aborted(e) => e,
        }
    }
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` attempts (at least one) have been made.
///
/// `attempt` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut, P>(
    max_attempts: usize,
    mut is_retryable: P,
    mut attempt: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut made = 0;

    loop {
        made += 1;
        match attempt(made).await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retryable(&err) => return Err(RetryError::Aborted(err)),
            Err(err) if made >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: made,
                    last: err,
                })
            }
            Err(_) => {
                debug!(attempt = made, max_attempts, "retryable failure, trying again");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Failure {
        Transient,
        Fatal,
    }

    #[tokio::test]
    async fn test_first_success_is_returned() {
        let mut calls = 0;
        let result: Result<usize, RetryError<Failure>> = retry(
            3,
            |_| true,
            |n| {
                calls += 1;
                async move { Ok(n) }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let result = retry(
            5,
            |e: &Failure| *e == Failure::Transient,
            |n| async move {
                if n < 4 {
                    Err(Failure::Transient)
                } else {
                    Ok(n)
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_last_error() {
        let mut calls = 0;
        let result: Result<(), _> = retry(
            6,
            |e: &Failure| *e == Failure::Transient,
            |_| {
                calls += 1;
                async { Err(Failure::Transient) }
            },
        )
        .await;
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 6);
                assert_eq!(last, Failure::Transient);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls, 6);
    }

    #[tokio::test]
    async fn test_non_retryable_error_aborts_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = retry(
            6,
            |e: &Failure| *e == Failure::Transient,
            |_| {
                calls += 1;
                async { Err(Failure::Fatal) }
            },
        )
        .await;
        assert!(matches!(result, Err(RetryError::Aborted(Failure::Fatal))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let result: Result<u8, RetryError<Failure>> = retry(0, |_| true, |_| async { Ok(9) }).await;
        assert_eq!(result.unwrap(), 9);
    }
}
