use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried alongside a request.
///
/// Cloning is cheap and every clone observes the same cancellation. A context is
/// done once it has been cancelled (directly or through its parent) or once its
/// deadline has passed.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless cancelled explicitly.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Derive a context cancelled together with `self`. The child keeps the
    /// parent's deadline unless `timeout` tightens it.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout) {
            (Some(d), Some(t)) => Some(d.min(Instant::now() + t)),
            (None, Some(t)) => Some(Instant::now() + t),
            (d, None) => d,
        };

        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Non-blocking liveness check used at dequeue time.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline.into()) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.is_done());
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = Context::background();
        let child = parent.child(None);
        assert!(!child.is_done());

        parent.cancel();
        assert!(child.is_done());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = Context::background();
        let child = parent.child(None);
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());
        assert!(ctx.is_done());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_child_tightens_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(60));
        let child = parent.child(Some(Duration::from_millis(10)));
        assert!(child.deadline().unwrap() < parent.deadline().unwrap());
    }

    #[tokio::test]
    async fn test_done_resolves_on_timeout() {
        let ctx = Context::with_timeout(Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(2), ctx.done())
            .await
            .expect("deadline should resolve done()");
        assert!(ctx.is_expired());
    }

    #[tokio::test]
    async fn test_done_resolves_on_cancel() {
        let ctx = Context::background();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });
        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("cancel should resolve done()")
            .unwrap();
    }
}
