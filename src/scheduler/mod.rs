pub mod pipeline;
pub mod report;
pub mod service;

pub use pipeline::run_pipeline;
pub use service::{minute_matches, Scheduler, ServiceState};
