// file: src/share/mod.rs
// description: Share Transport contract, listing types and directory provisioning
// reference: Internal module structure

pub mod provisioner;
pub mod smb;

use crate::error::Result;
use crate::models::RemotePath;
use async_trait::async_trait;
use std::path::Path;

pub use provisioner::{ProvisionReport, RemoteDirectoryProvisioner};
pub use smb::SmbClientTransport;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub path: RemotePath,
    pub entries: Vec<RemoteEntry>,
}

impl DirectoryListing {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }
}

/// Typed operations against the remote share. Paths are always structured segments.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ShareTransport: Send + Sync {
    /// Creates the last segment of `path`; its parent must already exist.
    async fn ensure_directory(&self, path: &RemotePath) -> Result<DirectoryStatus>;

    /// Places `local` at `remote`, where `remote` includes the file name.
    async fn put(&self, local: &Path, remote: &RemotePath) -> Result<()>;

    async fn list(&self, path: &RemotePath) -> Result<DirectoryListing>;
}
