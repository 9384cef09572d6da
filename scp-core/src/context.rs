//! Operation context carried through every handler, REST call and wait
//!
//! A context combines the engine's cancellation signal with the deadline of
//! the enclosing operation. Every blocking step of a handler runs through
//! [`OperationContext::run`], so cancelling aborts the in-flight request.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::provider::{ProviderError, ProviderResult};

#[derive(Debug, Clone)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancel: watch::Receiver<bool>,
}

/// Engine-side handle that cancels every context derived from it
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already, nothing to notify then
        let _ = self.tx.send(true);
    }
}

impl OperationContext {
    /// Context without deadline that is never cancelled
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self {
            deadline: None,
            cancel: rx,
        }
    }

    /// Context cancellable through the returned handle
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                deadline: None,
                cancel: rx,
            },
            CancelHandle { tx },
        )
    }

    /// Child context whose deadline is at most `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once the context is cancelled; never resolves otherwise
    async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Drive `fut` unless the context is cancelled or its deadline passes first
    pub async fn run<F, T>(&self, fut: F) -> ProviderResult<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(ProviderError::cancelled()),
            _ = self.expired() => Err(ProviderError::timeout("operation deadline exceeded")),
            out = fut => Ok(out),
        }
    }

    pub async fn sleep(&self, duration: Duration) -> ProviderResult<()> {
        self.run(tokio::time::sleep(duration)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ErrorKind;

    #[tokio::test]
    async fn run_completes_without_cancel() {
        let ctx = OperationContext::background();
        assert_eq!(ctx.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn cancelled_context_aborts_immediately() {
        let (ctx, handle) = OperationContext::with_cancel();
        handle.cancel();
        let err = ctx
            .run(tokio::time::sleep(Duration::from_secs(3600)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_long_future() {
        let ctx = OperationContext::background().with_timeout(Duration::from_secs(5));
        let err = ctx
            .run(tokio::time::sleep(Duration::from_secs(60)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn child_deadline_never_extends_parent() {
        let parent = OperationContext::background().with_timeout(Duration::from_secs(10));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());
    }
}
