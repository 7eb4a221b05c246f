use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::analytics::stats::ServiceStats;
use crate::config::ServiceConfig;
use crate::context::Context;
use crate::error::{Result, ServiceError};
use crate::processor::{Dispatcher, QueuedCall, RequestQueue};
use crate::service::{DoneSignal, Service, ServiceState};
use crate::throttle::RateLimiter;

/// Lifecycle, request queue and throttle shared by every service.
///
/// Requests are handled one at a time, in the order they were accepted, by a
/// dispatcher task that lives from [`start`](Self::start) to
/// [`stop`](Self::stop). The lifecycle is one-shot: a stopped service cannot be
/// started again.
pub struct BaseService<S: Service> {
    name: String,
    // Guards lifecycle transitions and request admission. Independent of the
    // limiter's own lock.
    state: Mutex<ServiceState>,
    queue: Arc<RequestQueue<QueuedCall>>,
    done: DoneSignal,
    limiter: Arc<RateLimiter>,
    stats: Arc<ServiceStats>,
    service: Arc<S>,
}

impl<S: Service> BaseService<S> {
    pub fn new(service: S, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ServiceState::Created),
            queue: Arc::new(RequestQueue::new()),
            done: DoneSignal::new(),
            limiter: Arc::new(RateLimiter::disabled()),
            stats: Arc::new(ServiceStats::new()),
            service: Arc::new(service),
        }
    }

    /// Build a service named and throttled according to `config`.
    pub fn from_config(service: S, config: &ServiceConfig) -> Self {
        let base = Self::new(service, config.name.clone());
        base.set_rate_limit(config.rate_limit);
        base
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> String {
        self.service.description()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServiceState::Running
    }

    /// Enter the running state, spawn the dispatcher, then run `on_start`.
    ///
    /// A failing `on_start` is reported, but the service stays running. Must be
    /// called from within a Tokio runtime.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            match *state {
                ServiceState::Running => {
                    return Err(ServiceError::AlreadyStarted(self.name.clone()))
                }
                ServiceState::Stopped => {
                    return Err(ServiceError::AlreadyStopped(self.name.clone()))
                }
                ServiceState::Created => {}
            }

            Dispatcher::new(
                self.name.clone(),
                self.queue.clone(),
                self.done.clone(),
                self.stats.clone(),
            )
            .spawn();
            *state = ServiceState::Running;
        }

        info!("{} started", self.name);

        self.service
            .on_start()
            .await
            .map_err(|source| ServiceError::StartHook {
                name: self.name.clone(),
                source,
            })
    }

    /// Enter the stopped state, fire the done signal, then run `on_stop`.
    ///
    /// Does not wait for an in-flight request; the dispatcher exits once that
    /// call returns. Anything still queued is discarded.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != ServiceState::Running {
                return Err(ServiceError::NotRunning(self.name.clone()));
            }

            *state = ServiceState::Stopped;
            self.done.fire();
        }

        info!("{} stopped", self.name);

        self.service
            .on_stop()
            .await
            .map_err(|source| ServiceError::StopHook {
                name: self.name.clone(),
                source,
            })
    }

    /// Queue a request for `on_request`. Silently ignored unless the service is
    /// running.
    pub fn request(&self, ctx: Context, args: S::Args) {
        let state = self.state.lock();
        if *state != ServiceState::Running {
            trace!("{} ignored a request while {}", self.name, *state);
            self.stats.inc_rejected();
            return;
        }

        let service = self.service.clone();
        let limiter = self.limiter.clone();
        self.queue.append(QueuedCall::new(ctx, move |ctx| async move {
            service.on_request(ctx, args, &limiter).await;
        }));
        self.stats.inc_enqueued();
    }

    /// Number of requests waiting. The one being handled is not counted.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Signal fired once the service stops.
    pub fn done(&self) -> DoneSignal {
        self.done.clone()
    }

    /// Permits per second for [`check_rate_limit`](Self::check_rate_limit);
    /// `0` disables throttling.
    pub fn set_rate_limit(&self, per_second: u32) {
        debug!("{} rate limit -> {}/s", self.name, per_second);
        self.limiter.set_rate(per_second);
    }

    pub fn rate_limit(&self) -> Option<u32> {
        self.limiter.rate()
    }

    /// Wait until the configured rate allows another call. Handlers receive the
    /// same limiter in `on_request`.
    pub async fn check_rate_limit(&self) {
        self.limiter.acquire().await;
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }
}

impl<S: Service> fmt::Display for BaseService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<S: Service> fmt::Debug for BaseService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseService")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("queued", &self.len())
            .field("limiter", &self.limiter)
            .finish()
    }
}
