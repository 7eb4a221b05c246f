pub mod base;
pub mod done;
pub mod state;

use async_trait::async_trait;

use crate::context::Context;
use crate::throttle::RateLimiter;

pub use base::BaseService;
pub use done::DoneSignal;
pub use state::ServiceState;

/// Hooks a concrete service plugs into [`BaseService`].
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Payload carried by each request.
    type Args: Send + 'static;

    /// Human-readable summary of what the service does.
    fn description(&self) -> String {
        String::new()
    }

    /// Called after the service has entered the running state.
    async fn on_start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the service has stopped.
    async fn on_stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handle one request. Never called concurrently for the same service.
    ///
    /// Throttling is cooperative: call `limiter.acquire().await` at the point
    /// where the configured rate should apply.
    async fn on_request(&self, ctx: Context, args: Self::Args, limiter: &RateLimiter);
}
