//! Cooperative cancellation for long-running loops and blocking waits.
//!
//! A [`CancelToken`] is shared by every task of a node. Cancelling it wakes
//! all current waiters; waits started afterwards return immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Returned by a wait that was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wait canceled")]
pub struct Canceled;

#[derive(Debug, Default)]
struct Inner {
    canceled: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and wake every waiter.
    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::Acquire)
    }

    /// Resolve once the token is cancelled.
    pub async fn canceled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_canceled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration`, or fail early if cancelled.
    pub async fn sleep(&self, duration: std::time::Duration) -> Result<(), Canceled> {
        tokio::select! {
            biased;
            () = self.canceled() => Err(Canceled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.canceled().await });
        tokio::task::yield_now().await;
        token.cancel();
        assert!(handle.await.is_ok());
        assert!(token.is_canceled());
    }

    #[tokio::test]
    async fn waits_after_cancel_return_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.canceled().await;
        assert_eq!(token.sleep(Duration::from_secs(3600)).await, Err(Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert_eq!(token.sleep(Duration::from_millis(10)).await, Ok(()));
    }
}
