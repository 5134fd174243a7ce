// file: src/archive/mod.rs
// description: Archiver contract and implementations
// reference: Internal module structure

pub mod zip;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub use zip::ZipArchiver;

#[cfg(test)]
use mockall::automock;

/// Packs a cloned directory into a single archive file.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, source_dir: &Path, destination: &Path) -> Result<()>;
}
