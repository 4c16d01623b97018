//! Fixed-budget fan-out with first-error cancellation.
//!
//! A [`SemaphoreGroup`] reserves exactly `size` units up front. Each unit runs
//! on its own task; the first failure fires a shared cancellation token so
//! units that have not started yet skip their body. Started units are never
//! interrupted.

use crate::error::{InvariantError, ReleaseError, RemoteError};
use std::future::Future;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why [`SemaphoreGroup::wait`] did not succeed
#[derive(Error, Debug)]
pub enum WaitError<E> {
    /// A unit failed; this is the first recorded failure
    #[error("{0}")]
    Failed(E),

    /// More units were submitted than the group reserved
    #[error("invalid group size: reserved {size}, submitted {submitted}")]
    InvalidSize {
        /// Reserved budget
        size: usize,
        /// Units submitted
        submitted: usize,
    },

    /// A unit panicked before finishing
    #[error("unit panicked: {reason}")]
    Panicked {
        /// Panic message, when it was a string
        reason: String,
    },

    /// The parent token fired before every unit finished
    #[error("group cancelled")]
    Cancelled,
}

impl From<WaitError<ReleaseError>> for ReleaseError {
    fn from(error: WaitError<ReleaseError>) -> Self {
        match error {
            WaitError::Failed(e) => e,
            WaitError::InvalidSize { size, submitted } => {
                InvariantError::GroupSize { size, submitted }.into()
            }
            WaitError::Panicked { reason } => InvariantError::UnitPanicked { reason }.into(),
            WaitError::Cancelled => RemoteError::Cancelled {
                operation: "artifact publishing".to_string(),
            }
            .into(),
        }
    }
}

/// Bounded group of independent units sharing one cancellation signal
#[derive(Debug)]
pub struct SemaphoreGroup<E> {
    size: usize,
    /// Starts at `-size`; reaches zero when every reserved unit has finished
    pending: Arc<AtomicIsize>,
    submitted: AtomicUsize,
    token: CancellationToken,
    cause: Arc<Mutex<Option<WaitError<E>>>>,
}

impl<E: Send + 'static> SemaphoreGroup<E> {
    /// Reserve `size` units.
    ///
    /// A zero-sized group is complete from the start: submitted units never
    /// run and [`wait`](Self::wait) returns immediately.
    pub fn new(size: usize) -> Self {
        Self::with_token(CancellationToken::new(), size)
    }

    /// Reserve `size` units under `parent`; cancelling the parent stops the group.
    pub fn with_parent(parent: &CancellationToken, size: usize) -> Self {
        Self::with_token(parent.child_token(), size)
    }

    fn with_token(token: CancellationToken, size: usize) -> Self {
        if size == 0 {
            token.cancel();
        }
        Self {
            size,
            pending: Arc::new(AtomicIsize::new(-(size as isize))),
            submitted: AtomicUsize::new(0),
            token,
            cause: Arc::new(Mutex::new(None)),
        }
    }

    /// Reserved budget
    pub fn size(&self) -> usize {
        self.size
    }

    /// Submit one unit. Does nothing once the group has been cancelled.
    pub fn go<F>(&self, unit: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        if self.token.is_cancelled() {
            return;
        }

        let token = self.token.clone();
        let pending = Arc::clone(&self.pending);
        let cause = Arc::clone(&self.cause);

        tokio::spawn(async move {
            if token.is_cancelled() {
                return;
            }
            // own task so a panic surfaces as a JoinError instead of a lost unit
            let failure = match tokio::spawn(unit).await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(WaitError::Failed(e)),
                Err(join) => Some(WaitError::Panicked {
                    reason: panic_reason(join),
                }),
            };

            // the cause must be visible before this unit counts as finished
            if let Some(failure) = failure {
                let mut slot = cause.lock().unwrap_or_else(|p| p.into_inner());
                if slot.is_none() {
                    *slot = Some(failure);
                }
                drop(slot);
                token.cancel();
            }

            if pending.fetch_add(1, Ordering::SeqCst) + 1 >= 0 {
                token.cancel();
            }
        });
    }

    /// Block until every reserved unit succeeded or the group was cancelled.
    ///
    /// Submitting fewer units than reserved (and none failing) never completes.
    /// A panicking unit counts as a failure.
    pub async fn wait(&self) -> Result<(), WaitError<E>> {
        self.token.cancelled().await;

        if self.size == 0 {
            return Ok(());
        }

        let submitted = self.submitted.load(Ordering::SeqCst);
        if submitted > self.size {
            return Err(WaitError::InvalidSize {
                size: self.size,
                submitted,
            });
        }

        let failure = self.cause.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(failure) = failure {
            return Err(failure);
        }

        if self.pending.load(Ordering::SeqCst) >= 0 {
            Ok(())
        } else {
            Err(WaitError::Cancelled)
        }
    }
}

fn panic_reason(join: tokio::task::JoinError) -> String {
    match join.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string()),
        Err(join) => join.to_string(),
    }
}
