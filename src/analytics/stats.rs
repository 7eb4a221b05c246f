use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Per-service counters. Updated by producers and the dispatcher without locking.
#[derive(Debug, Default)]
pub struct ServiceStats {
    enqueued: AtomicU64,
    rejected: AtomicU64,
    handled: AtomicU64,
    dropped: AtomicU64,

    // Last observed value only, gauge-like.
    last_handle_latency_us: AtomicU64,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// A request arrived while the service was not running.
    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// A queued request was discarded at dequeue time.
    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handled(&self, latency: Duration) {
        self.handled.fetch_add(1, Ordering::Relaxed);
        self.last_handle_latency_us
            .store(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn last_handle_latency(&self) -> Duration {
        Duration::from_micros(self.last_handle_latency_us.load(Ordering::Relaxed))
    }

    pub fn log_stats(&self, name: &str) {
        info!(
            "STATS {}: Enqueued: {} | Rejected: {} | Handled: {} | Dropped: {} | \
             Last latency: {}us",
            name,
            self.enqueued(),
            self.rejected(),
            self.handled(),
            self.dropped(),
            self.last_handle_latency_us.load(Ordering::Relaxed),
        );
    }
}
