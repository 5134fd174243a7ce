// file: src/pipeline/processor.rs
// description: per-repository clone, archive, upload state machine with scoped local cleanup
// reference: state machine driven by JobState transitions

use crate::archive::Archiver;
use crate::config::RunConfiguration;
use crate::error::Result;
use crate::models::{Job, JobOutcome, JobState, JobStatus, RemotePath, RepositoryDescriptor};
use crate::repository::CloneProvider;
use crate::share::ShareTransport;
use crate::utils::{OperationTimer, Validator};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct RepositoryProcessor {
    settings: Arc<RunConfiguration>,
    cloner: Arc<dyn CloneProvider>,
    archiver: Arc<dyn Archiver>,
    transport: Arc<dyn ShareTransport>,
}

impl RepositoryProcessor {
    pub fn new(
        settings: Arc<RunConfiguration>,
        cloner: Arc<dyn CloneProvider>,
        archiver: Arc<dyn Archiver>,
        transport: Arc<dyn ShareTransport>,
    ) -> Self {
        Self {
            settings,
            cloner,
            archiver,
            transport,
        }
    }

    /// Runs one repository to a terminal state. Never returns an error: failures
    /// are recorded in the outcome, and the job's local files are gone on return.
    pub async fn process(&self, descriptor: RepositoryDescriptor) -> JobOutcome {
        let timer = OperationTimer::new(&format!("repository {}", descriptor.name));
        let repository = descriptor.name.clone();

        let status = match Validator::validate_repository_name(&repository) {
            Ok(()) => {
                let job = Job::new(
                    descriptor,
                    &self.settings.staging_root,
                    &self.settings.archive_extension,
                );
                let guard = StagingGuard::new(&job);
                let status = self.drive(&job).await;
                guard.release().await;
                status
            }
            Err(error) => JobStatus::Failed {
                stage: JobState::Cloning,
                error,
            },
        };

        let outcome = JobOutcome {
            repository,
            status,
            elapsed: timer.finish(),
        };
        log_outcome(&outcome);
        outcome
    }

    async fn drive(&self, job: &Job) -> JobStatus {
        let mut state = JobState::Cloning;

        while !state.is_terminal() {
            debug!(repository = %job.name(), "Entering {}", state);
            match self.step(job, state).await {
                Ok(next) => state = next,
                Err(error) => return JobStatus::Failed { stage: state, error },
            }
        }

        JobStatus::Done
    }

    async fn step(&self, job: &Job, state: JobState) -> Result<JobState> {
        match state {
            JobState::Cloning => {
                let endpoint = self
                    .settings
                    .credentials
                    .embed_in(&job.descriptor.clone_url)?;
                self.cloner
                    .clone_repository(&endpoint, &job.clone_dir)
                    .await?;
                Ok(JobState::Archiving)
            }
            JobState::Archiving => {
                self.archiver
                    .archive(&job.clone_dir, &job.archive_path)
                    .await?;
                Ok(JobState::VerifyingRemoteLayout)
            }
            JobState::VerifyingRemoteLayout => {
                if self.settings.verify_remote_layout {
                    self.verify_remote_layout(job).await;
                }
                Ok(JobState::Uploading)
            }
            JobState::Uploading => {
                let destination = self.settings.remote_base_path.join(&job.archive_name)?;
                info!(repository = %job.name(), "Uploading to {}", destination);
                self.transport.put(&job.archive_path, &destination).await?;
                Ok(JobState::VerifyingUpload)
            }
            JobState::VerifyingUpload => {
                if self.settings.verify_upload {
                    self.verify_upload(job).await;
                }
                Ok(JobState::Done)
            }
            JobState::Done | JobState::Failed => Ok(state),
        }
    }

    async fn verify_remote_layout(&self, job: &Job) {
        let base = &self.settings.remote_base_path;
        let levels: Vec<RemotePath> = if base.is_root() {
            vec![RemotePath::root()]
        } else {
            base.prefixes().collect()
        };

        for level in levels {
            match self.transport.list(&level).await {
                Ok(listing) => debug!(
                    repository = %job.name(),
                    "Remote {} holds: {}",
                    level,
                    listing.names().join(", ")
                ),
                Err(e) => warn!(repository = %job.name(), "Layout check skipped: {}", e),
            }
        }
    }

    async fn verify_upload(&self, job: &Job) {
        let base = &self.settings.remote_base_path;
        match self.transport.list(base).await {
            Ok(listing) if listing.contains(&job.archive_name) => {
                debug!(repository = %job.name(), "{} present in {}", job.archive_name, base)
            }
            Ok(_) => warn!(
                repository = %job.name(),
                "{} not visible in {} after upload",
                job.archive_name,
                base
            ),
            Err(e) => warn!(repository = %job.name(), "Upload check skipped: {}", e),
        }
    }
}

fn log_outcome(outcome: &JobOutcome) {
    match &outcome.status {
        JobStatus::Done => info!(
            repository = %outcome.repository,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Repository migrated"
        ),
        JobStatus::Failed { stage, error } => error!(
            repository = %outcome.repository,
            stage = %stage,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Repository failed: {}",
            error
        ),
    }
}

/// Owns a job's clone directory and archive file.
///
/// `release` removes them on the blocking pool; a guard dropped without
/// release (the job future was cancelled) removes them inline.
struct StagingGuard {
    repository: String,
    paths: Option<[PathBuf; 2]>,
}

impl StagingGuard {
    fn new(job: &Job) -> Self {
        Self {
            repository: job.name().to_string(),
            paths: Some([job.clone_dir.clone(), job.archive_path.clone()]),
        }
    }

    async fn release(mut self) {
        let Some(paths) = self.paths.take() else {
            return;
        };
        let repository = self.repository.clone();

        let removal = tokio::task::spawn_blocking(move || {
            for path in &paths {
                remove_artifact(&repository, path);
            }
        })
        .await;

        if let Err(e) = removal {
            warn!(repository = %self.repository, "Cleanup task failed: {}", e);
        }
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if let Some(paths) = self.paths.take() {
            for path in &paths {
                remove_artifact(&self.repository, path);
            }
        }
    }
}

/// Best effort: a failed removal is logged and otherwise ignored.
fn remove_artifact(repository: &str, path: &Path) {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => debug!(repository, path = %path.display(), "Removed staging artifact"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(
            repository,
            path = %path.display(),
            "Cleanup failed: {}",
            e
        ),
    }
}
