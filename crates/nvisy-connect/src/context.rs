//! Cancellation context for establishment attempts.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`ConnectContext`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The context was cancelled explicitly.
    Cancelled,
    /// The context deadline elapsed.
    DeadlineExceeded,
}

/// A cancellable execution context with an optional deadline.
///
/// Cloning a context shares its cancellation state. Use [`child`] to derive a
/// context that is cancelled together with its parent but can also be
/// cancelled or given a tighter deadline on its own.
///
/// [`child`]: ConnectContext::child
#[derive(Debug, Clone, Default)]
pub struct ConnectContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ConnectContext {
    /// Creates a context that finishes only when cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from an existing cancellation token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Returns a context that also finishes after `timeout` from now.
    ///
    /// An existing earlier deadline is kept. A timeout too large to be
    /// represented as an instant adds no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Returns a context that also finishes at `deadline`.
    ///
    /// An existing earlier deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derives a child context inheriting the parent's cancellation and deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the deadline, if any.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the underlying cancellation token.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the reason this context is done, or `None` if it is still live.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            Some(CancelReason::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Returns whether this context is already done.
    pub fn is_done(&self) -> bool {
        self.reason().is_some()
    }

    /// Waits until the context is cancelled or its deadline elapses.
    ///
    /// Explicit cancellation takes precedence when both are ready.
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => CancelReason::Cancelled,
                () = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_context_is_done() {
        let ctx = ConnectContext::new();
        assert!(!ctx.is_done());

        ctx.cancel();
        assert_eq!(ctx.reason(), Some(CancelReason::Cancelled));
        assert_eq!(ctx.done().await, CancelReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let ctx = ConnectContext::new().with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_done());
        assert_eq!(ctx.done().await, CancelReason::DeadlineExceeded);
        assert!(ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_is_kept() {
        let ctx = ConnectContext::new().with_timeout(Duration::from_secs(1));
        let first = ctx.deadline();
        let ctx = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.deadline(), first);
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_adds_no_deadline() {
        let ctx = ConnectContext::new()
            .child()
            .with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ctx.deadline(), None);
        assert!(!ctx.is_done());

        let ctx = ConnectContext::new()
            .with_timeout(Duration::from_secs(5))
            .with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_some());
    }

    #[tokio::test]
    async fn test_child_follows_parent() {
        let parent = ConnectContext::new();
        let child = parent.child();
        parent.cancel();
        assert_eq!(child.done().await, CancelReason::Cancelled);
    }

    #[tokio::test]
    async fn test_child_cancel_leaves_parent_live() {
        let parent = ConnectContext::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }
}
