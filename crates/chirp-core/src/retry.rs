use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::{CoreError, CoreResult};

const BACKOFF_STEP: Duration = Duration::from_millis(25);

/// Re-run `f` while it fails with busy/locked storage errors, at most
/// `attempts` times in total.
pub(crate) fn with_retry<T, F>(attempts: u32, op: &'static str, mut f: F) -> CoreResult<T>
where
    F: FnMut() -> CoreResult<T>,
{
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match f() {
            Err(CoreError::Storage(e)) if chirp_db::is_transient(&e) => {
                warn!(op, attempt, "Transient storage failure: {}", e);
                if attempt < attempts {
                    thread::sleep(BACKOFF_STEP * attempt);
                }
            }
            other => return other,
        }
    }
    Err(CoreError::StorageUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn busy() -> CoreError {
        CoreError::Storage(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            None,
        ))
    }

    #[test]
    fn recovers_after_transient_failures() {
        let mut calls = 0;
        let out = with_retry(3, "test", || {
            calls += 1;
            if calls < 3 { Err(busy()) } else { Ok(calls) }
        });
        assert_eq!(out.unwrap(), 3);
    }

    #[test]
    fn exhaustion_is_storage_unavailable() {
        let mut calls = 0;
        let out: CoreResult<()> = with_retry(2, "test", || {
            calls += 1;
            Err(busy())
        });
        assert!(matches!(out, Err(CoreError::StorageUnavailable)));
        assert_eq!(calls, 2);
    }

    #[test]
    fn domain_errors_are_not_retried() {
        let mut calls = 0;
        let out: CoreResult<()> = with_retry(5, "test", || {
            calls += 1;
            Err(CoreError::TweetNotFound)
        });
        assert!(matches!(out, Err(CoreError::TweetNotFound)));
        assert_eq!(calls, 1);
    }
}
