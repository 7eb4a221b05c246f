use tokio_util::sync::CancellationToken;

/// One-shot broadcast fired when a service stops.
///
/// Clones share the same state, so a handle taken before `stop` observes the
/// transition.
#[derive(Debug, Clone, Default)]
pub struct DoneSignal {
    token: CancellationToken,
}

impl DoneSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fire(&self) {
        self.token.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the service has stopped; immediately if it already has.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}
