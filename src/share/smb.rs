// file: src/share/smb.rs
// description: smbclient-backed Share Transport with structured, validated arguments
// reference: https://www.samba.org/samba/docs/current/man-html/smbclient.1.html

use crate::config::{Secret, ShareConfig};
use crate::error::{ArchiverError, Result};
use crate::models::RemotePath;
use crate::share::{DirectoryListing, DirectoryStatus, RemoteEntry, ShareTransport};
use crate::utils::Validator;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const NAME_COLLISION: &str = "NT_STATUS_OBJECT_NAME_COLLISION";
const ATTRIBUTE_CHARS: &str = "ADHSRNCIEXOLPTV";

pub struct SmbClientTransport {
    program: PathBuf,
    service: String,
    username: String,
    password: Secret,
    domain: Option<String>,
}

#[derive(Debug)]
struct ScriptOutput {
    success: bool,
    status: String,
    stdout: String,
    stderr: String,
}

impl ScriptOutput {
    fn nt_status(&self) -> Option<&str> {
        [self.stdout.as_str(), self.stderr.as_str()]
            .into_iter()
            .flat_map(str::split_whitespace)
            .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_'))
            .find(|token| is_status_code(token) && *token != "NT_STATUS_OK")
    }

    fn describe(&self) -> String {
        let detail = match self.nt_status() {
            Some(status) => status.to_string(),
            None => Validator::truncate_text(self.stderr.trim(), 300),
        };
        format!("smbclient exited with {}: {}", self.status, detail)
    }

    fn failed(&self) -> bool {
        !self.success || self.nt_status().is_some()
    }
}

impl SmbClientTransport {
    pub fn new(config: &ShareConfig) -> Self {
        Self {
            program: config.smbclient_path.clone(),
            service: format!("//{}/{}", config.server, config.share_name),
            username: config.username.clone(),
            password: config.password.clone(),
            domain: config.domain.clone().filter(|d| !d.is_empty()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    async fn run_script(&self, script: &str) -> std::io::Result<ScriptOutput> {
        debug!("smbclient {} -c '{}'", self.service, script);

        let mut command = Command::new(&self.program);
        command.arg(&self.service);

        if self.username.is_empty() {
            command.arg("-N");
        } else {
            command.arg("-U").arg(&self.username);
            command.env("PASSWD", self.password.expose());
        }

        if let Some(domain) = &self.domain {
            command.arg("-W").arg(domain);
        }

        let output = command
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(ScriptOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[async_trait]
impl ShareTransport for SmbClientTransport {
    async fn ensure_directory(&self, path: &RemotePath) -> Result<DirectoryStatus> {
        let fail = |message: String| ArchiverError::Provisioning {
            path: path.to_string(),
            message,
        };

        if path.is_root() {
            return Ok(DirectoryStatus::AlreadyExists);
        }

        let output = self
            .run_script(&mkdir_script(path))
            .await
            .map_err(|e| fail(format!("Failed to run smbclient: {}", e)))?;

        match output.nt_status() {
            Some(NAME_COLLISION) => Ok(DirectoryStatus::AlreadyExists),
            _ if output.failed() => Err(fail(output.describe())),
            _ => Ok(DirectoryStatus::Created),
        }
    }

    async fn put(&self, local: &Path, remote: &RemotePath) -> Result<()> {
        let repository = remote
            .segments()
            .last()
            .cloned()
            .unwrap_or_else(|| local.display().to_string());
        let fail = |message: String| ArchiverError::Upload {
            repository: repository.clone(),
            message,
        };

        if remote.is_root() {
            return Err(fail("Remote destination has no file name".to_string()));
        }

        let local_str = local.to_string_lossy();
        Validator::validate_share_argument(&local_str, "local archive path")
            .map_err(|e| fail(e.to_string()))?;

        let output = self
            .run_script(&put_script(&local_str, remote))
            .await
            .map_err(|e| fail(format!("Failed to run smbclient: {}", e)))?;

        if output.failed() {
            return Err(fail(output.describe()));
        }
        Ok(())
    }

    async fn list(&self, path: &RemotePath) -> Result<DirectoryListing> {
        let output = self
            .run_script(&list_script(path))
            .await
            .map_err(|e| ArchiverError::DiagnosticList {
                path: path.to_string(),
                message: format!("Failed to run smbclient: {}", e),
            })?;

        if output.failed() {
            return Err(ArchiverError::DiagnosticList {
                path: path.to_string(),
                message: output.describe(),
            });
        }

        Ok(DirectoryListing {
            path: path.clone(),
            entries: parse_listing(&output.stdout),
        })
    }
}

/// `NT_STATUS_` followed only by upper-case letters, digits and underscores.
/// File names echoed by `put` or `ls` never qualify.
fn is_status_code(token: &str) -> bool {
    token
        .strip_prefix("NT_STATUS_")
        .is_some_and(|code| {
            !code.is_empty()
                && code
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        })
}

fn mkdir_script(path: &RemotePath) -> String {
    format!("mkdir \"{}\"", path.to_share_path())
}

fn put_script(local: &str, remote: &RemotePath) -> String {
    format!("put \"{}\" \"{}\"", local, remote.to_share_path())
}

fn list_script(path: &RemotePath) -> String {
    format!("cd \"{}\"; ls", path.to_share_path())
}

/// Parses `ls` lines of the form `  <name>  <attrs>  <size>  <weekday month day hh:mm:ss year>`.
fn parse_listing(stdout: &str) -> Vec<RemoteEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 7 {
                return None;
            }

            let size_idx = tokens.len() - 6;
            let size = tokens[size_idx].parse::<u64>().ok()?;

            let attrs = tokens[size_idx - 1];
            let has_attrs =
                size_idx >= 2 && attrs.chars().all(|c| ATTRIBUTE_CHARS.contains(c));
            let name_end = if has_attrs { size_idx - 1 } else { size_idx };

            let name = tokens[..name_end].join(" ");
            if name.is_empty() || name == "." || name == ".." {
                return None;
            }

            Some(RemoteEntry {
                name,
                is_dir: has_attrs && attrs.contains('D'),
                size,
            })
        })
        .collect()
}
