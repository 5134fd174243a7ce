// file: src/archive/zip.rs
// description: zip subprocess archiver, success decided by exit status
// reference: https://linux.die.net/man/1/zip

use crate::archive::Archiver;
use crate::error::{ArchiverError, Result};
use crate::utils::Validator;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

pub struct ZipArchiver {
    program: PathBuf,
}

impl ZipArchiver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new("zip")
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    /// Runs inside the source's parent so entries are stored as `<name>/...`.
    async fn archive(&self, source_dir: &Path, destination: &Path) -> Result<()> {
        let repository = source_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source_dir.display().to_string());

        let fail = |message: String| ArchiverError::Archive {
            repository: repository.clone(),
            message,
        };

        let (Some(parent), Some(entry)) = (source_dir.parent(), source_dir.file_name()) else {
            return Err(fail(format!(
                "Source has no parent directory: {}",
                source_dir.display()
            )));
        };
        let destination = std::path::absolute(destination)
            .map_err(|e| fail(format!("Cannot resolve {}: {}", destination.display(), e)))?;

        info!("Archiving {} to {}", repository, destination.display());

        let output = Command::new(&self.program)
            .arg("-r")
            .arg("-q")
            .arg("-y")
            .arg(&destination)
            .arg(entry)
            .current_dir(parent)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| fail(format!("Failed to run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                Validator::truncate_text(stderr.trim(), 500)
            )));
        }

        debug!("Archive written to {}", destination.display());
        Ok(())
    }
}
