use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{AuthError, CancelReason};

/// Per-invocation context. Collaborator calls made on behalf of a request
/// are bounded by its cancellation token and optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Cancels the context when the returned guard is dropped, e.g. when a
    /// request future is abandoned because its client went away.
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    /// Fails fast if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<(), AuthError> {
        if self.cancel.is_cancelled() {
            return Err(AuthError::Cancelled(CancelReason::Cancelled));
        }
        if matches!(self.deadline, Some(deadline) if Instant::now() >= deadline) {
            return Err(AuthError::Cancelled(CancelReason::DeadlineExceeded));
        }
        Ok(())
    }

    /// Drives `fut` to completion unless the context is cancelled or the
    /// deadline passes first, in which case `fut` is dropped.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<AuthError>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AuthError::Cancelled(CancelReason::Cancelled)),
            _ = deadline => Err(AuthError::Cancelled(CancelReason::DeadlineExceeded)),
            result = fut => result.map_err(Into::into),
        }
    }
}
