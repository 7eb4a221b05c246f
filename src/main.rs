use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use queued_service::config::ServiceConfig;
use queued_service::{BaseService, Context, RateLimiter, Result, Service};

/// Logs every request it receives, paced by the configured rate limit.
struct EchoService;

#[async_trait]
impl Service for EchoService {
    type Args = String;

    fn description(&self) -> String {
        "Echoes requests to the log".to_string()
    }

    async fn on_start(&self) -> anyhow::Result<()> {
        info!("Echo service ready");
        Ok(())
    }

    async fn on_request(&self, ctx: Context, args: String, limiter: &RateLimiter) {
        limiter.acquire().await;
        if ctx.is_done() {
            return;
        }
        info!("echo: {}", args);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load Config
    let config = ServiceConfig::load()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let service = BaseService::from_config(EchoService, &config);
    info!(
        "Starting {} ({}), rate limit: {:?}",
        service,
        service.description(),
        service.rate_limit()
    );

    service.start().await?;

    for i in 1..=5 {
        service.request(Context::with_timeout(Duration::from_secs(30)), format!("request {}", i));
    }

    // Keep main alive
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down...");
    service.stop().await?;
    service.stats().log_stats(service.name());

    Ok(())
}
