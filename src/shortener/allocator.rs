use thiserror::Error;
use tracing::{info, warn};

use super::code::generate_code;
use super::retry::{retry, RetryError};
use crate::models::ShortLink;
use crate::storage::{Storage, StorageError};

/// Total attempts (the first try plus five retries) before giving up
pub const MAX_ALLOCATION_ATTEMPTS: usize = 6;

/// Top-level paths the router serves itself; a short code equal to one of
/// these could never redirect
pub const RESERVED_CODES: &[&str] = &["health", "api"];

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("could not find a free short code after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error("storage error while allocating short code: {0}")]
    Storage(anyhow::Error),
}

/// Persist `destination` under a freshly generated, unique short code.
///
/// The destination must already have passed URL validation.
pub async fn allocate(
    storage: &dyn Storage,
    destination: &str,
) -> Result<ShortLink, AllocationError> {
    allocate_with(storage, destination, generate_code).await
}

/// Same as [`allocate`] with an explicit source of candidate codes.
///
/// Only `StorageError::Conflict` is retried; the uniqueness constraint in
/// the store is what keeps concurrent allocations apart.
pub async fn allocate_with<G>(
    storage: &dyn Storage,
    destination: &str,
    mut next_code: G,
) -> Result<ShortLink, AllocationError>
where
    G: FnMut() -> String,
{
    let result = retry(
        MAX_ALLOCATION_ATTEMPTS,
        |err: &StorageError| matches!(err, StorageError::Conflict),
        |attempt| {
            let code = next_code();
            async move {
                if RESERVED_CODES.contains(&code.as_str()) {
                    warn!(short_code = %code, attempt, "generated a reserved short code");
                    return Err(StorageError::Conflict);
                }
                let created = storage.create_with_code(&code, destination).await;
                if matches!(created, Err(StorageError::Conflict)) {
                    warn!(short_code = %code, attempt, "short code collision");
                }
                created
            }
        },
    )
    .await;

    match result {
        Ok(link) => {
            info!(short_code = %link.code, "allocated short code");
            Ok(link)
        }
        Err(RetryError::Exhausted { attempts, .. }) => {
            warn!(attempts, "short code allocation exhausted");
            Err(AllocationError::Exhausted { attempts })
        }
        Err(RetryError::Aborted(err)) => Err(AllocationError::Storage(err.into())),
    }
}
