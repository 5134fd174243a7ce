// file: src/repository/enumerator.rs
// description: Paginated enumeration of every repository owned by an organization
// reference: page-until-empty listing over a PageSource

use crate::error::{ArchiverError, Result};
use crate::models::RepositoryDescriptor;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// One page of the organization's repository listing. Pages are 1-based.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<RepositoryDescriptor>>;
}

pub struct RepositoryEnumerator {
    source: Arc<dyn PageSource>,
    per_page: u32,
}

impl RepositoryEnumerator {
    pub fn new(source: Arc<dyn PageSource>, per_page: u32) -> Self {
        Self {
            source,
            per_page: per_page.max(1),
        }
    }

    /// Requests pages 1, 2, ... until the first empty page.
    ///
    /// Any failing page aborts the whole enumeration; a partial list is never returned.
    pub async fn enumerate(&self) -> Result<Vec<RepositoryDescriptor>> {
        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = self
                .source
                .fetch_page(page, self.per_page)
                .await
                .map_err(|e| match e {
                    ArchiverError::Enumeration(_) => e,
                    other => ArchiverError::Enumeration(format!("page {}: {}", page, other)),
                })?;

            if batch.is_empty() {
                debug!("Page {} is empty, enumeration complete", page);
                break;
            }

            debug!("Page {} returned {} repositories", page, batch.len());
            repositories.extend(batch);
            page += 1;
        }

        info!(
            "Enumerated {} repositories across {} pages",
            repositories.len(),
            page
        );
        Ok(repositories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePageSource;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_pagination_until_empty_page() {
        let source = Arc::new(FakePageSource::with_page_sizes(&[100, 100, 37, 0]));
        let enumerator = RepositoryEnumerator::new(source.clone(), 100);

        let repositories = enumerator.enumerate().await.unwrap();

        assert_eq!(repositories.len(), 237);
        assert_eq!(source.requests(), 4);
        assert_eq!(repositories[0].name, "repo-1-0");
        assert_eq!(repositories[236].name, "repo-3-36");
    }

    #[tokio::test]
    async fn test_empty_organization() {
        let source = Arc::new(FakePageSource::with_page_sizes(&[0]));
        let enumerator = RepositoryEnumerator::new(source.clone(), 100);

        let repositories = enumerator.enumerate().await.unwrap();

        assert!(repositories.is_empty());
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn test_failing_page_is_not_end_of_listing() {
        let source = Arc::new(FakePageSource::with_page_sizes(&[100, 100, 5, 0]).failing_on(2));
        let enumerator = RepositoryEnumerator::new(source.clone(), 100);

        let result = enumerator.enumerate().await;

        assert!(matches!(result, Err(ArchiverError::Enumeration(_))));
        assert_eq!(source.requests(), 2);
    }

    #[tokio::test]
    async fn test_non_enumeration_errors_are_wrapped() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch_page()
            .with(eq(1), eq(50))
            .times(1)
            .returning(|_, _| Err(ArchiverError::Validation("bad payload".to_string())));

        let enumerator = RepositoryEnumerator::new(Arc::new(source), 50);
        let err = enumerator.enumerate().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Repository enumeration failed: page 1: Validation error: bad payload"
        );
    }
}
