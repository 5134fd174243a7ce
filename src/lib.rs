// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod archive;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod share;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{Archiver, ZipArchiver};
pub use config::{
    Config, FailurePolicy, PipelineConfig, RunConfiguration, ShareConfig, SourceConfig,
};
pub use error::{ArchiverError, Result};
pub use models::{Credentials, Job, JobOutcome, JobState, RemotePath, RepositoryDescriptor};
pub use pipeline::{
    ConcurrencyLimiter, ProgressTracker, RepositoryProcessor, RunCoordinator, RunSummary,
};
pub use repository::{
    CloneProvider, GithubClient, GixCloneProvider, PageSource, RepositoryEnumerator,
};
pub use share::{
    DirectoryListing, DirectoryStatus, ProvisionReport, RemoteDirectoryProvisioner,
    ShareTransport, SmbClientTransport,
};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
