// file: src/testing.rs
// description: instrumented in-memory collaborators shared by unit tests
// reference: hand-written fakes alongside mockall mocks

use crate::archive::Archiver;
use crate::error::{ArchiverError, Result};
use crate::models::{RemotePath, RepositoryDescriptor};
use crate::repository::{CloneProvider, PageSource};
use crate::share::{DirectoryListing, DirectoryStatus, RemoteEntry, ShareTransport};
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Serves pre-built pages; any page past the last one is empty.
pub(crate) struct FakePageSource {
    pages: Vec<Vec<RepositoryDescriptor>>,
    fail_on: Option<u32>,
    requests: AtomicU32,
}

impl FakePageSource {
    pub fn with_page_sizes(sizes: &[usize]) -> Self {
        let pages = sizes
            .iter()
            .enumerate()
            .map(|(idx, size)| {
                (0..*size)
                    .map(|i| {
                        let name = format!("repo-{}-{}", idx + 1, i);
                        let url = format!("https://github.com/acme/{}.git", name);
                        RepositoryDescriptor::new(name, url)
                    })
                    .collect()
            })
            .collect();
        Self {
            pages,
            fail_on: None,
            requests: AtomicU32::new(0),
        }
    }

    pub fn with_names(names: &[&str]) -> Self {
        let page = names
            .iter()
            .map(|name| {
                RepositoryDescriptor::new(*name, format!("https://github.com/acme/{}.git", name))
            })
            .collect();
        Self {
            pages: vec![page],
            fail_on: None,
            requests: AtomicU32::new(0),
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on = Some(page);
        self
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for FakePageSource {
    async fn fetch_page(&self, page: u32, _per_page: u32) -> Result<Vec<RepositoryDescriptor>> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.fail_on == Some(page) {
            return Err(ArchiverError::Enumeration(format!(
                "Listing page {} failed with status 502 Bad Gateway",
                page
            )));
        }

        let idx = page.saturating_sub(1) as usize;
        Ok(self.pages.get(idx).cloned().unwrap_or_default())
    }
}

/// Counts repositories that currently own anything in the staging root.
pub(crate) struct DiskGauge {
    root: PathBuf,
    peak: AtomicUsize,
}

impl DiskGauge {
    pub fn new(root: &Path) -> Arc<Self> {
        Arc::new(Self {
            root: root.to_path_buf(),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn sample(&self) {
        let owners: HashSet<String> = fs::read_dir(&self.root)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| {
                        let path = entry.path();
                        if path.is_dir() {
                            file_label(&path)
                        } else {
                            path.file_stem()
                                .map(|s| s.to_string_lossy().to_string())
                                .unwrap_or_default()
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.peak.fetch_max(owners.len(), Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Materialises a tiny working tree instead of fetching anything.
pub(crate) struct FakeCloneProvider {
    fail_for: HashSet<String>,
    delay: Duration,
    gauge: Option<Arc<DiskGauge>>,
    calls: AtomicUsize,
    endpoints: Mutex<Vec<String>>,
}

impl FakeCloneProvider {
    pub fn new() -> Self {
        Self {
            fail_for: HashSet::new(),
            delay: Duration::ZERO,
            gauge: None,
            calls: AtomicUsize::new(0),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, name: &str) -> Self {
        self.fail_for.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<DiskGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloneProvider for FakeCloneProvider {
    async fn clone_repository(&self, endpoint: &Url, destination: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().unwrap().push(endpoint.to_string());
        let name = file_label(destination);

        fs::create_dir_all(destination.join(".git"))?;
        if let Some(gauge) = &self.gauge {
            gauge.sample();
        }

        if self.fail_for.contains(&name) {
            return Err(ArchiverError::Clone {
                repository: name,
                message: "authentication required".to_string(),
            });
        }

        fs::write(destination.join("README.md"), format!("# {}\n", name))?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

/// Writes a placeholder archive; failing repositories leave a partial file behind.
pub(crate) struct FakeArchiver {
    fail_for: HashSet<String>,
    gauge: Option<Arc<DiskGauge>>,
}

impl FakeArchiver {
    pub fn new() -> Self {
        Self {
            fail_for: HashSet::new(),
            gauge: None,
        }
    }

    pub fn failing_for(mut self, name: &str) -> Self {
        self.fail_for.insert(name.to_string());
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<DiskGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }
}

#[async_trait]
impl Archiver for FakeArchiver {
    async fn archive(&self, source_dir: &Path, destination: &Path) -> Result<()> {
        let name = file_label(source_dir);
        if !source_dir.is_dir() {
            return Err(ArchiverError::Archive {
                repository: name,
                message: "source directory missing".to_string(),
            });
        }

        fs::write(destination, b"PK\x03\x04")?;
        if let Some(gauge) = &self.gauge {
            gauge.sample();
        }

        if self.fail_for.contains(&name) {
            return Err(ArchiverError::Archive {
                repository: name,
                message: "zip exited with exit status: 12".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory share that records every call in order.
pub(crate) struct FakeShareTransport {
    directories: Mutex<HashSet<RemotePath>>,
    files: Mutex<Vec<RemotePath>>,
    events: Mutex<Vec<String>>,
    fail_put_for: HashSet<String>,
    fail_list: bool,
    list_calls: AtomicUsize,
}

impl FakeShareTransport {
    pub fn new() -> Self {
        Self {
            directories: Mutex::new(HashSet::new()),
            files: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            fail_put_for: HashSet::new(),
            fail_list: false,
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_put_for(mut self, file_name: &str) -> Self {
        self.fail_put_for.insert(file_name.to_string());
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter_map(|path| path.segments().last().cloned())
            .collect();
        names.sort();
        names
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

fn parent_of(path: &RemotePath) -> RemotePath {
    let segments = path.segments();
    let parent = &segments[..segments.len().saturating_sub(1)];
    RemotePath::from_segments(parent.iter().cloned()).unwrap_or_default()
}

#[async_trait]
impl ShareTransport for FakeShareTransport {
    async fn ensure_directory(&self, path: &RemotePath) -> Result<DirectoryStatus> {
        self.events.lock().unwrap().push(format!("mkdir {}", path));
        if self.directories.lock().unwrap().insert(path.clone()) {
            Ok(DirectoryStatus::Created)
        } else {
            Ok(DirectoryStatus::AlreadyExists)
        }
    }

    async fn put(&self, local: &Path, remote: &RemotePath) -> Result<()> {
        self.events.lock().unwrap().push(format!("put {}", remote));
        let file_name = remote.segments().last().cloned().unwrap_or_default();

        if !local.is_file() {
            return Err(ArchiverError::Upload {
                repository: file_name,
                message: format!("local archive missing: {}", local.display()),
            });
        }

        if self.fail_put_for.contains(&file_name) {
            return Err(ArchiverError::Upload {
                repository: file_name,
                message: "NT_STATUS_DISK_FULL".to_string(),
            });
        }

        self.files.lock().unwrap().push(remote.clone());
        Ok(())
    }

    async fn list(&self, path: &RemotePath) -> Result<DirectoryListing> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(ArchiverError::DiagnosticList {
                path: path.to_string(),
                message: "NT_STATUS_ACCESS_DENIED".to_string(),
            });
        }

        let entries = self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|file| parent_of(file) == *path)
            .filter_map(|file| file.segments().last().cloned())
            .map(|name| RemoteEntry {
                name,
                is_dir: false,
                size: 4,
            })
            .collect();

        Ok(DirectoryListing {
            path: path.clone(),
            entries,
        })
    }
}
