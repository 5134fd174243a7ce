// file: src/models/job.rs
// description: per-repository job, its state machine states and its recorded outcome
// reference: internal data structures

use crate::error::ArchiverError;
use crate::models::RepositoryDescriptor;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Binds one descriptor to the local paths it owns inside the staging root.
#[derive(Debug, Clone)]
pub struct Job {
    pub descriptor: RepositoryDescriptor,
    pub clone_dir: PathBuf,
    pub archive_path: PathBuf,
    pub archive_name: String,
}

impl Job {
    pub fn new(descriptor: RepositoryDescriptor, staging_root: &Path, extension: &str) -> Self {
        let archive_name = format!("{}.{}", descriptor.name, extension);
        Self {
            clone_dir: staging_root.join(&descriptor.name),
            archive_path: staging_root.join(&archive_name),
            archive_name,
            descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Cloning,
    Archiving,
    VerifyingRemoteLayout,
    Uploading,
    VerifyingUpload,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Cloning => "cloning",
            JobState::Archiving => "archiving",
            JobState::VerifyingRemoteLayout => "verifying remote layout",
            JobState::Uploading => "uploading",
            JobState::VerifyingUpload => "verifying upload",
            JobState::Done => "done",
            JobState::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub enum JobStatus {
    Done,
    /// `stage` is the active state the job was in when it failed.
    Failed { stage: JobState, error: ArchiverError },
}

#[derive(Debug)]
pub struct JobOutcome {
    pub repository: String,
    pub status: JobStatus,
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Done)
    }

    pub fn final_state(&self) -> JobState {
        match self.status {
            JobStatus::Done => JobState::Done,
            JobStatus::Failed { .. } => JobState::Failed,
        }
    }

    pub fn error(&self) -> Option<&ArchiverError> {
        match &self.status {
            JobStatus::Done => None,
            JobStatus::Failed { error, .. } => Some(error),
        }
    }

    pub fn failed_stage(&self) -> Option<JobState> {
        match &self.status {
            JobStatus::Done => None,
            JobStatus::Failed { stage, .. } => Some(*stage),
        }
    }
}
