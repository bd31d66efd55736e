//! Call context threaded through every backend call
//!
//! A [`CallContext`] carries the cancellation token and the optional deadline
//! of one reconciliation pass. Backends race their requests against it, and
//! the executor checks it before issuing each operation.

use crate::error::ClientError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline for one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Creates a context with a fresh token and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context bound to an existing token (e.g. one cancelled on shutdown).
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Sets the deadline to `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels the context. Calls already in flight observe it at their next await.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns an error if the context is cancelled or past its deadline.
    pub fn check(&self) -> Result<(), ClientError> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ClientError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `fut` unless the context is cancelled or expires first.
    ///
    /// When cancellation wins the race the request may or may not have reached
    /// the API server; nothing is undone.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ClientError::Cancelled),
            () = wait_for_deadline(self.deadline) => Err(ClientError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_without_cancellation() {
        let ctx = CallContext::new();
        let result = ctx.run(async { Ok::<_, ClientError>(7) }).await;
        assert_eq!(result.ok(), Some(7));
    }

    #[tokio::test]
    async fn test_cancelled_context_rejects_new_calls() {
        let ctx = CallContext::new();
        ctx.cancel();

        assert!(matches!(ctx.check(), Err(ClientError::Cancelled)));
        let result = ctx.run(async { Ok::<_, ClientError>(()) }).await;
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_slow_call() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ClientError>(())
        };

        let result = ctx.run(slow).await;
        assert!(matches!(result, Err(ClientError::DeadlineExceeded)));
        assert!(matches!(ctx.check(), Err(ClientError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_absolute_deadline() {
        let deadline = Instant::now() + Duration::from_secs(30);
        let ctx = CallContext::new().with_deadline(deadline);
        assert_eq!(ctx.deadline(), Some(deadline));
        assert!(ctx.check().is_ok());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(matches!(ctx.check(), Err(ClientError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_sets_deadline_from_now() {
        assert_eq!(CallContext::new().deadline(), None);

        let start = Instant::now();
        let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(start + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_shared_token_cancels_clones() {
        let token = CancellationToken::new();
        let ctx = CallContext::with_token(token.clone());
        let clone = ctx.clone();

        token.cancel();
        assert!(matches!(clone.check(), Err(ClientError::Cancelled)));
    }
}
