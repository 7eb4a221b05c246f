pub mod analytics;
pub mod config;
pub mod context;
pub mod error;
pub mod processor;
pub mod service;
pub mod throttle;

pub use context::Context;
pub use error::{Result, ServiceError};
pub use service::{BaseService, DoneSignal, Service, ServiceState};
pub use throttle::RateLimiter;
