// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod limiter;
pub mod orchestrator;
pub mod processor;
mod progress;

pub use limiter::ConcurrencyLimiter;
pub use orchestrator::{RunCoordinator, RunSummary, reset_staging_root};
pub use processor::RepositoryProcessor;
pub use progress::{ProgressTracker, RunStats};
