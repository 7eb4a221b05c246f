pub mod dispatcher;
pub mod queue;

pub use dispatcher::{Dispatcher, QueuedCall};
pub use queue::RequestQueue;
