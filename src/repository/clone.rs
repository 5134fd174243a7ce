// file: src/repository/clone.rs
// description: Repository cloning using gix
// reference: https://docs.rs/gix

use crate::error::{ArchiverError, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::path::Path;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// Clones a repository into a fresh local directory.
///
/// `endpoint` may carry credentials and must never be logged as-is.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CloneProvider: Send + Sync {
    async fn clone_repository(&self, endpoint: &Url, destination: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct GixCloneProvider;

impl GixCloneProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloneProvider for GixCloneProvider {
    async fn clone_repository(&self, endpoint: &Url, destination: &Path) -> Result<()> {
        let repository = repository_label(destination);
        let secret = endpoint.password().map(str::to_string);
        let url = endpoint.to_string();
        let target = destination.to_path_buf();

        info!("Cloning {} from {}", repository, redacted_endpoint(endpoint));

        let outcome = tokio::task::spawn_blocking(move || clone_blocking(&url, &target))
            .await
            .map_err(|e| ArchiverError::Clone {
                repository: repository.clone(),
                message: format!("Clone task failed: {}", e),
            })?;

        outcome.map_err(|message| ArchiverError::Clone {
            repository,
            message: redact(&message, secret.as_deref()),
        })
    }
}

fn clone_blocking(url: &str, destination: &Path) -> std::result::Result<(), String> {
    let mut prepare = gix::prepare_clone(url, destination)
        .map_err(|e| format!("Failed to prepare clone: {}", e))?;

    let (mut checkout, _) = prepare
        .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| format!("Fetch failed: {}", e))?;

    let (repo, _) = checkout
        .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| format!("Checkout failed: {}", e))?;

    debug!("Checked out worktree at {}", repo.path().display());
    Ok(())
}

fn repository_label(destination: &Path) -> String {
    destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| destination.display().to_string())
}

/// Endpoint with any embedded password replaced, safe for logs.
pub fn redacted_endpoint(endpoint: &Url) -> String {
    let mut display = endpoint.clone();
    if display.password().is_some() {
        let _ = display.set_password(Some("***"));
    }
    display.to_string()
}

fn redact(message: &str, secret: Option<&str>) -> String {
    match secret {
        Some(secret) if !secret.is_empty() => message.replace(secret, "***"),
        _ => message.to_string(),
    }
}
