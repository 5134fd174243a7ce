// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod job;
pub mod remote_path;
pub mod repository;

pub use job::{Job, JobOutcome, JobState, JobStatus};
pub use remote_path::RemotePath;
pub use repository::{Credentials, RepositoryDescriptor};
