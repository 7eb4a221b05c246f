use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::analytics::stats::ServiceStats;
use crate::context::Context;
use crate::processor::queue::RequestQueue;
use crate::service::DoneSignal;

type DeferredCall = Box<dyn FnOnce(Context) -> BoxFuture<'static, ()> + Send>;

/// A request waiting in the queue: the caller's context plus the handler call,
/// with its argument already bound.
pub struct QueuedCall {
    ctx: Context,
    call: DeferredCall,
}

impl QueuedCall {
    pub fn new<F, Fut>(ctx: Context, f: F) -> Self
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            ctx,
            call: Box::new(move |ctx| f(ctx).boxed()),
        }
    }
}

impl std::fmt::Debug for QueuedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedCall").field("ctx", &self.ctx).finish()
    }
}

/// The single consumer of a service's queue.
pub struct Dispatcher {
    name: String,
    queue: Arc<RequestQueue<QueuedCall>>,
    done: DoneSignal,
    stats: Arc<ServiceStats>,
}

impl Dispatcher {
    pub fn new(
        name: String,
        queue: Arc<RequestQueue<QueuedCall>>,
        done: DoneSignal,
        stats: Arc<ServiceStats>,
    ) -> Self {
        Self {
            name,
            queue,
            done,
            stats,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until the done signal fires. Calls are awaited one at a time in queue
    /// order. Whatever is still queued at that point is discarded.
    pub async fn run(self) {
        debug!("{} dispatcher started", self.name);

        loop {
            tokio::select! {
                biased;
                _ = self.done.wait() => break,
                _ = self.queue.signal() => {
                    self.queue.process(|call| self.dispatch(call)).await;
                }
            }
        }

        // Done is set, so every remaining call is dropped and counted.
        self.queue.process(|call| self.dispatch(call)).await;

        debug!("{} dispatcher exited", self.name);
    }

    async fn dispatch(&self, queued: QueuedCall) {
        let QueuedCall { ctx, call } = queued;

        if ctx.is_done() || self.done.is_done() {
            trace!("{} dropped a request", self.name);
            self.stats.inc_dropped();
            return;
        }

        let start = Instant::now();
        call(ctx).await;
        self.stats.record_handled(start.elapsed());
    }
}
