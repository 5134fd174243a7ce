// file: src/share/provisioner.rs
// description: idempotent creation of the remote base directory, one segment at a time
// reference: internal provisioning logic

use crate::models::RemotePath;
use crate::share::{DirectoryStatus, ShareTransport};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<RemotePath>,
    pub existing: Vec<RemotePath>,
    pub warnings: Vec<String>,
}

impl ProvisionReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub struct RemoteDirectoryProvisioner {
    transport: Arc<dyn ShareTransport>,
}

impl RemoteDirectoryProvisioner {
    pub fn new(transport: Arc<dyn ShareTransport>) -> Self {
        Self { transport }
    }

    /// Creates every missing prefix of `base`, outermost first.
    ///
    /// Never fails: an error is recorded as a warning and descent stops there,
    /// leaving the uploads to surface any real problem per repository.
    pub async fn provision(&self, base: &RemotePath) -> ProvisionReport {
        let mut report = ProvisionReport::default();

        if base.is_root() {
            debug!("Remote base is the share root, nothing to provision");
            return report;
        }

        for prefix in base.prefixes() {
            match self.transport.ensure_directory(&prefix).await {
                Ok(DirectoryStatus::Created) => {
                    info!("Created remote directory {}", prefix);
                    report.created.push(prefix);
                }
                Ok(DirectoryStatus::AlreadyExists) => {
                    debug!("Remote directory {} already exists", prefix);
                    report.existing.push(prefix);
                }
                Err(e) => {
                    warn!(path = %prefix, "Provisioning warning: {}", e);
                    report.warnings.push(e.to_string());
                    break;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiverError;
    use crate::share::MockShareTransport;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn path(raw: &str) -> RemotePath {
        RemotePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_creates_each_segment_in_order() {
        let mut transport = MockShareTransport::new();
        let mut seq = Sequence::new();
        for expected in ["a", "a/b", "a/b/c"] {
            let expected = path(expected);
            transport
                .expect_ensure_directory()
                .withf(move |p| *p == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(DirectoryStatus::Created));
        }

        let provisioner = RemoteDirectoryProvisioner::new(Arc::new(transport));
        let report = provisioner.provision(&path("a/b/c")).await;

        assert_eq!(report.created, vec![path("a"), path("a/b"), path("a/b/c")]);
        assert!(report.existing.is_empty());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_second_run_sees_existing_directories() {
        let made: Arc<Mutex<HashSet<RemotePath>>> = Arc::default();
        let mut transport = MockShareTransport::new();
        let seen = made.clone();
        transport.expect_ensure_directory().returning(move |p| {
            if seen.lock().unwrap().insert(p.clone()) {
                Ok(DirectoryStatus::Created)
            } else {
                Ok(DirectoryStatus::AlreadyExists)
            }
        });

        let provisioner = RemoteDirectoryProvisioner::new(Arc::new(transport));
        let first = provisioner.provision(&path("Backups/GitHub")).await;
        let second = provisioner.provision(&path("Backups/GitHub")).await;

        assert_eq!(first.created.len(), 2);
        assert!(second.created.is_empty());
        assert_eq!(second.existing, vec![path("Backups"), path("Backups/GitHub")]);
        assert!(second.is_clean());
    }

    #[tokio::test]
    async fn test_error_stops_descent_without_failing() {
        let mut transport = MockShareTransport::new();
        transport
            .expect_ensure_directory()
            .withf(|p| p.len() == 1)
            .returning(|_| Ok(DirectoryStatus::AlreadyExists));
        transport
            .expect_ensure_directory()
            .withf(|p| p.len() == 2)
            .times(1)
            .returning(|p| {
                Err(ArchiverError::Provisioning {
                    path: p.to_string(),
                    message: "NT_STATUS_ACCESS_DENIED".to_string(),
                })
            });

        let provisioner = RemoteDirectoryProvisioner::new(Arc::new(transport));
        let report = provisioner.provision(&path("a/b/c")).await;

        assert_eq!(report.existing, vec![path("a")]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("NT_STATUS_ACCESS_DENIED"));
    }

    #[tokio::test]
    async fn test_root_base_is_a_no_op() {
        let transport = MockShareTransport::new();
        let provisioner = RemoteDirectoryProvisioner::new(Arc::new(transport));
        let report = provisioner.provision(&RemotePath::root()).await;
        assert_eq!(report, ProvisionReport::default());
    }
}
