// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{ArchiverError, Result};
use crate::models::{Credentials, RemotePath};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "GIT_ARCHIVER";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub source: SourceConfig,
    pub staging: StagingConfig,
    pub share: ShareConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub organization: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: Option<Secret>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    pub root: PathBuf,
    #[serde(default = "default_archive_extension")]
    pub archive_extension: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShareConfig {
    pub server: String,
    pub share_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub remote_path: String,
    #[serde(default = "default_smbclient_path")]
    pub smbclient_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_archiver_path")]
    pub archiver_path: PathBuf,
    #[serde(default = "default_true")]
    pub verify_remote_layout: bool,
    #[serde(default = "default_true")]
    pub verify_upload: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
            archiver_path: default_archiver_path(),
            verify_remote_layout: true,
            verify_upload: true,
        }
    }
}

/// Whether repository failures change the process exit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Failures are reported but the run still succeeds once every job was attempted.
    #[default]
    Ignore,
    /// Any failed repository makes the run fail.
    FailRun,
}

/// A configuration value that must never appear in logs.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("<redacted>")
        }
    }
}

/// Immutable view of everything a run needs, derived once from [`Config`].
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub organization: String,
    pub per_page: u32,
    pub concurrency_limit: usize,
    pub staging_root: PathBuf,
    pub archive_extension: String,
    pub remote_share_name: String,
    pub remote_base_path: RemotePath,
    pub credentials: Credentials,
    pub failure_policy: FailurePolicy,
    pub verify_remote_layout: bool,
    pub verify_upload: bool,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_user_agent() -> String {
    format!("git_archiver/{}", env!("CARGO_PKG_VERSION"))
}

fn default_archive_extension() -> String {
    "zip".to_string()
}

fn default_smbclient_path() -> PathBuf {
    PathBuf::from("smbclient")
}

fn default_concurrency() -> usize {
    4
}

fn default_archiver_path() -> PathBuf {
    PathBuf::from("zip")
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ArchiverError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| ArchiverError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            source: SourceConfig {
                api_url: default_api_url(),
                organization: "example-org".to_string(),
                username: String::new(),
                token: None,
                per_page: default_per_page(),
                user_agent: default_user_agent(),
            },
            staging: StagingConfig {
                root: PathBuf::from("./tmp_repos"),
                archive_extension: default_archive_extension(),
            },
            share: ShareConfig {
                server: "fileserver".to_string(),
                share_name: "backups".to_string(),
                username: String::new(),
                password: Secret::default(),
                domain: None,
                remote_path: "GitHub".to_string(),
                smbclient_path: default_smbclient_path(),
            },
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.concurrency == 0 {
            return Err(ArchiverError::Config(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.source.per_page) {
            return Err(ArchiverError::Config(
                "per_page must be between 1 and 100".to_string(),
            ));
        }

        if self.source.organization.trim().is_empty() {
            return Err(ArchiverError::Config(
                "source.organization must be set".to_string(),
            ));
        }

        Validator::validate_url(&self.source.api_url)
            .map_err(|e| ArchiverError::Config(e.to_string()))?;

        if self.share.server.trim().is_empty() || self.share.share_name.trim().is_empty() {
            return Err(ArchiverError::Config(
                "share.server and share.share_name must be set".to_string(),
            ));
        }

        Validator::validate_share_argument(&self.share.server, "share server")
            .and_then(|_| Validator::validate_share_argument(&self.share.share_name, "share name"))
            .map_err(|e| ArchiverError::Config(e.to_string()))?;

        let extension = self.staging.archive_extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ArchiverError::Config(
                "staging.archive_extension must not be empty".to_string(),
            ));
        }
        Validator::validate_share_segment(extension)
            .map_err(|e| ArchiverError::Config(format!("staging.archive_extension: {}", e)))?;

        if self.staging.root.as_os_str().is_empty() || self.staging.root.parent().is_none() {
            return Err(ArchiverError::Config(format!(
                "staging.root must be a dedicated directory, got '{}'",
                self.staging.root.display()
            )));
        }

        self.remote_base_path()?;
        Ok(())
    }

    pub fn remote_base_path(&self) -> Result<RemotePath> {
        RemotePath::parse(&self.share.remote_path)
            .map_err(|e| ArchiverError::Config(format!("share.remote_path: {}", e)))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.source.username.clone(),
            self.source
                .token
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| t.expose().to_string()),
        )
    }

    pub fn run_configuration(&self) -> Result<RunConfiguration> {
        Ok(RunConfiguration {
            organization: self.source.organization.clone(),
            per_page: self.source.per_page,
            concurrency_limit: self.pipeline.concurrency.max(1),
            staging_root: self.staging.root.clone(),
            archive_extension: self
                .staging
                .archive_extension
                .trim_start_matches('.')
                .to_string(),
            remote_share_name: self.share.share_name.clone(),
            remote_base_path: self.remote_base_path()?,
            credentials: self.credentials(),
            failure_policy: self.pipeline.failure_policy,
            verify_remote_layout: self.pipeline.verify_remote_layout,
            verify_upload: self.pipeline.verify_upload,
        })
    }
}
