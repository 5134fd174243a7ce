// file: src/pipeline/orchestrator.rs
// description: coordinates staging reset, provisioning, enumeration and bounded job dispatch
// reference: orchestrates the asynchronous migration workflow

use crate::archive::{Archiver, ZipArchiver};
use crate::config::{Config, FailurePolicy, RunConfiguration};
use crate::error::{ArchiverError, Result};
use crate::models::{JobOutcome, JobState, JobStatus, RepositoryDescriptor};
use crate::pipeline::limiter::ConcurrencyLimiter;
use crate::pipeline::processor::RepositoryProcessor;
use crate::pipeline::progress::{ProgressTracker, RunStats};
use crate::repository::{
    CloneProvider, GithubClient, GixCloneProvider, PageSource, RepositoryEnumerator,
};
use crate::share::{
    ProvisionReport, RemoteDirectoryProvisioner, ShareTransport, SmbClientTransport,
};
use crate::utils::OperationTimer;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Aggregate result of a run in which every enumerated repository was attempted.
#[derive(Debug)]
pub struct RunSummary {
    pub enumerated: usize,
    pub outcomes: Vec<JobOutcome>,
    pub provision: ProvisionReport,
    pub stats: RunStats,
    pub duration: Duration,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn should_fail(&self, policy: FailurePolicy) -> bool {
        match policy {
            FailurePolicy::Ignore => false,
            FailurePolicy::FailRun => self.failed() > 0,
        }
    }
}

pub struct RunCoordinator {
    settings: Arc<RunConfiguration>,
    source: Arc<dyn PageSource>,
    cloner: Arc<dyn CloneProvider>,
    archiver: Arc<dyn Archiver>,
    transport: Arc<dyn ShareTransport>,
    show_progress: bool,
    colored: bool,
}

impl RunCoordinator {
    pub fn new(
        settings: RunConfiguration,
        source: Arc<dyn PageSource>,
        cloner: Arc<dyn CloneProvider>,
        archiver: Arc<dyn Archiver>,
        transport: Arc<dyn ShareTransport>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            source,
            cloner,
            archiver,
            transport,
            show_progress: false,
            colored: true,
        }
    }

    /// Wires the production collaborators: GitHub, gix, zip and smbclient.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = config.run_configuration()?;
        let source = GithubClient::new(&config.source, settings.credentials.clone())?;

        Ok(Self::new(
            settings,
            Arc::new(source),
            Arc::new(GixCloneProvider::new()),
            Arc::new(ZipArchiver::new(config.pipeline.archiver_path.clone())),
            Arc::new(SmbClientTransport::new(&config.share)),
        ))
    }

    pub fn with_progress(mut self, show: bool, colored: bool) -> Self {
        self.show_progress = show;
        self.colored = colored;
        self
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let timer = OperationTimer::new("migration run");
        info!(
            "Starting migration of {} to share {} at {} (concurrency {})",
            self.settings.organization,
            self.settings.remote_share_name,
            self.settings.remote_base_path,
            self.settings.concurrency_limit
        );

        reset_staging_root(&self.settings.staging_root)?;

        let provision = self.provision().await;

        let descriptors = RepositoryEnumerator::new(self.source.clone(), self.settings.per_page)
            .enumerate()
            .await
            .inspect_err(|e| error!("Aborting run: {}", e))?;
        let enumerated = descriptors.len();

        if descriptors.is_empty() {
            warn!("Organization {} has no repositories", self.settings.organization);
        }

        let progress = if self.show_progress {
            ProgressTracker::new(enumerated, self.colored)
        } else {
            ProgressTracker::hidden(enumerated)
        };

        let processor = RepositoryProcessor::new(
            self.settings.clone(),
            self.cloner.clone(),
            self.archiver.clone(),
            self.transport.clone(),
        );
        let limiter = ConcurrencyLimiter::new(self.settings.concurrency_limit);

        let (descriptors, rejected) =
            reject_local_collisions(descriptors, &self.settings.archive_extension);
        for outcome in &rejected {
            progress.record(outcome);
        }

        let (processor, progress) = (&processor, &progress);
        let work = descriptors.into_iter().map(move |descriptor| {
            move || async move {
                progress.set_message(format!("Processing {}", descriptor.name));
                let outcome = processor.process(descriptor).await;
                progress.record(&outcome);
                outcome
            }
        });
        let mut outcomes = limiter.run(work).await;
        outcomes.extend(rejected);
        progress.finish();

        let summary = RunSummary {
            enumerated,
            outcomes,
            provision,
            stats: progress.get_stats(),
            duration: timer.finish(),
        };
        log_summary(&summary);
        Ok(summary)
    }

    /// Creates the remote base path. Shares the transport with the jobs.
    pub async fn provision(&self) -> ProvisionReport {
        RemoteDirectoryProvisioner::new(self.transport.clone())
            .provision(&self.settings.remote_base_path)
            .await
    }

    /// Enumeration only, for listing without migrating.
    pub async fn enumerate(&self) -> Result<Vec<RepositoryDescriptor>> {
        RepositoryEnumerator::new(self.source.clone(), self.settings.per_page)
            .enumerate()
            .await
    }
}

/// Splits off descriptors whose local paths overlap an earlier descriptor's,
/// e.g. `api.zip` cloning into the archive path of `api`. Earlier wins.
fn reject_local_collisions(
    descriptors: Vec<RepositoryDescriptor>,
    extension: &str,
) -> (Vec<RepositoryDescriptor>, Vec<JobOutcome>) {
    let mut claimed: HashSet<String> = HashSet::new();
    let mut accepted = Vec::with_capacity(descriptors.len());
    let mut rejected = Vec::new();

    for descriptor in descriptors {
        let archive_name = format!("{}.{}", descriptor.name, extension);
        if claimed.contains(&descriptor.name) || claimed.contains(&archive_name) {
            let error = ArchiverError::Validation(format!(
                "Repository {} shares a staging path with another repository",
                descriptor.name
            ));
            error!(repository = %descriptor.name, "Repository failed: {}", error);
            rejected.push(JobOutcome {
                repository: descriptor.name,
                status: JobStatus::Failed {
                    stage: JobState::Cloning,
                    error,
                },
                elapsed: Duration::ZERO,
            });
            continue;
        }

        claimed.insert(descriptor.name.clone());
        claimed.insert(archive_name);
        accepted.push(descriptor);
    }

    (accepted, rejected)
}

/// Removes the staging root if present and recreates it empty.
pub fn reset_staging_root(root: &Path) -> Result<()> {
    let staging_error = |source: std::io::Error| ArchiverError::Staging {
        path: root.to_path_buf(),
        source,
    };

    if root.as_os_str().is_empty() || root.parent().is_none() {
        return Err(staging_error(std::io::Error::new(
            ErrorKind::InvalidInput,
            "refusing to reset a filesystem root",
        )));
    }

    match fs::remove_dir_all(root) {
        Ok(()) => info!("Cleared staging root {}", root.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(staging_error(e)),
    }

    fs::create_dir_all(root).map_err(staging_error)
}

fn log_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    info!("=== Migration Summary ===");
    info!("Duration: {:.1} seconds", summary.duration.as_secs_f64());
    info!("Repositories enumerated: {}", summary.enumerated);
    info!("Repositories attempted: {}", summary.attempted());
    info!("Uploaded: {}", summary.succeeded());
    info!("Failed: {}", summary.failed());
    info!("Success rate: {:.2}%", stats.success_rate());
    info!(
        "Throughput: {:.1} repositories/min",
        stats.repositories_per_minute()
    );
    for failure in summary.failures() {
        if let Some(err) = failure.error() {
            warn!(repository = %failure.repository, "  {}", err);
        }
    }
    if !summary.provision.is_clean() {
        warn!(
            "Remote provisioning reported {} warning(s)",
            summary.provision.warnings.len()
        );
    }
    info!("=========================");
}
