pub mod stats;

pub use stats::ServiceStats;
