//! Operation lock.
//!
//! Sync, snapshot and removal must not interleave: each one holds the
//! store for its whole duration. [`OperationLock`] is a non-reentrant
//! async mutex; a busy lock is reported as `Error::Locked` instead of
//! queueing the caller.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Error, Result};

/// Non-reentrant lock serializing long-running operations.
#[derive(Debug, Default)]
pub struct OperationLock {
    inner: Mutex<()>,
}

/// Held while an operation runs; released on drop.
#[derive(Debug)]
pub struct OperationGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl OperationLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire without waiting.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another operation holds the lock.
    pub fn try_acquire(&self) -> Result<OperationGuard<'_>> {
        self.inner
            .try_lock()
            .map(|guard| OperationGuard { _guard: guard })
            .map_err(|_| {
                debug!("Operation lock is busy");
                Error::Locked
            })
    }

    /// Acquire, waiting at most `timeout` (forever when `None`).
    ///
    /// # Errors
    ///
    /// Returns `Locked` when the timeout elapses first.
    pub async fn acquire(&self, timeout: Option<Duration>) -> Result<OperationGuard<'_>> {
        let guard = match timeout {
            None => self.inner.lock().await,
            Some(limit) => tokio::time::timeout(limit, self.inner.lock())
                .await
                .map_err(|_| Error::Locked)?,
        };
        Ok(OperationGuard { _guard: guard })
    }

    /// Whether an operation currently holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_fast() {
        let lock = OperationLock::new();
        let guard = lock.try_acquire().unwrap();
        assert!(lock.is_locked());
        assert!(matches!(lock.try_acquire(), Err(Error::Locked)));

        drop(guard);
        assert!(!lock.is_locked());
        assert!(lock.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn test_acquire_times_out() {
        let lock = OperationLock::new();
        let _held = lock.try_acquire().unwrap();

        let result = lock.acquire(Some(Duration::from_millis(10))).await;
        assert!(matches!(result, Err(Error::Locked)));
    }
}
