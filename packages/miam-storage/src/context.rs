//! Per-call cancellation and deadline context
//!
//! Every store operation receives an [`OpContext`]. Stores call
//! [`OpContext::check`] before each statement, so a cancelled request or an
//! expired deadline stops the work at the next statement boundary and any open
//! transaction is rolled back instead of committed.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, Result, StorageError};

#[derive(Debug, Clone, Default)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// Context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// Derive a child with a deadline no later than `now + timeout`.
    ///
    /// Cancelling the parent cancels the child; the child's own cancellation
    /// does not propagate upwards.
    pub fn timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancelled or past its deadline
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fail fast when the caller gave up on `operation`.
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(StorageError::new(
                ErrorKind::Cancelled,
                format!("{} cancelled", operation),
            ));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(StorageError::new(
                    ErrorKind::DeadlineExceeded,
                    format!("{} exceeded its deadline", operation),
                ));
            }
        }
        Ok(())
    }
}
