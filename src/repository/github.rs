// file: src/repository/github.rs
// description: GitHub REST client listing organization repositories page by page
// reference: https://docs.github.com/en/rest/repos/repos#list-organization-repositories

use crate::config::SourceConfig;
use crate::error::{ArchiverError, Result};
use crate::models::{Credentials, RepositoryDescriptor};
use crate::repository::enumerator::PageSource;
use crate::utils::Validator;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GithubRepository {
    name: String,
    clone_url: String,
}

impl From<GithubRepository> for RepositoryDescriptor {
    fn from(repo: GithubRepository) -> Self {
        RepositoryDescriptor::new(repo.name, repo.clone_url)
    }
}

pub struct GithubClient {
    client: Client,
    api_url: String,
    organization: String,
    credentials: Credentials,
}

impl GithubClient {
    pub fn new(config: &SourceConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ArchiverError::Enumeration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            organization: config.organization.clone(),
            credentials,
        })
    }

    fn repos_url(&self) -> String {
        format!("{}/orgs/{}/repos", self.api_url, self.organization)
    }
}

#[async_trait]
impl PageSource for GithubClient {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<RepositoryDescriptor>> {
        debug!(
            "Requesting repositories of {} (page {}, per_page {})",
            self.organization, page, per_page
        );

        let mut request = self
            .client
            .get(self.repos_url())
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[("per_page", per_page), ("page", page)]);

        if self.credentials.has_token() {
            request = request.basic_auth(
                &self.credentials.username,
                self.credentials.token.as_deref(),
            );
        }

        let response = request.send().await.map_err(|e| {
            ArchiverError::Enumeration(format!("Failed to request page {}: {}", page, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ArchiverError::Enumeration(format!(
                "Listing page {} failed with status {}: {}",
                page,
                status,
                Validator::truncate_text(&error_text, 300)
            )));
        }

        let repositories: Vec<GithubRepository> = response.json().await.map_err(|e| {
            ArchiverError::Enumeration(format!("Failed to parse page {}: {}", page, e))
        })?;

        Ok(repositories.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned HTTP response and hands back the raw request head.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn client_for(api_url: String, credentials: Credentials) -> GithubClient {
        let mut config = Config::default_config();
        config.source.api_url = api_url;
        config.source.organization = "acme".to_string();
        let mut client = GithubClient::new(&config.source, credentials).unwrap();
        client.client = Client::builder()
            .user_agent(config.source.user_agent.clone())
            .no_proxy()
            .build()
            .unwrap();
        client
    }

    #[test]
    fn test_repos_url_trims_trailing_slash() {
        let client = client_for("https://api.github.com/".to_string(), Credentials::default());
        assert_eq!(client.repos_url(), "https://api.github.com/orgs/acme/repos");
    }

    #[tokio::test]
    async fn test_fetch_page_maps_descriptors() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"id":1,"name":"billing","clone_url":"https://github.com/acme/billing.git","private":true},
                {"id":2,"name":"web","clone_url":"https://github.com/acme/web.git"}]"#,
        )
        .await;
        let client = client_for(url, Credentials::new("octocat", Some("ghp_token".to_string())));

        let page = client.fetch_page(2, 50).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(
            page,
            vec![
                RepositoryDescriptor::new("billing", "https://github.com/acme/billing.git"),
                RepositoryDescriptor::new("web", "https://github.com/acme/web.git"),
            ]
        );
        assert!(request.starts_with("GET /orgs/acme/repos?per_page=50&page=2 "));
        assert!(request.to_lowercase().contains("authorization: basic "));
        assert!(request.to_lowercase().contains("user-agent: git_archiver/"));
    }

    #[tokio::test]
    async fn test_fetch_page_without_token_is_anonymous() {
        let (url, server) = serve_once("200 OK", "[]").await;
        let client = client_for(url, Credentials::new("octocat", None));

        let page = client.fetch_page(1, 100).await.unwrap();
        let request = server.await.unwrap();

        assert!(page.is_empty());
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_empty_token_is_anonymous() {
        let (url, server) = serve_once("200 OK", "[]").await;
        let client = client_for(url, Credentials::new("octocat", Some(String::new())));

        client.fetch_page(1, 100).await.unwrap();
        let request = server.await.unwrap();

        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_enumeration_error() {
        let (url, server) = serve_once(
            "403 Forbidden",
            r#"{"message":"API rate limit exceeded"}"#,
        )
        .await;
        let client = client_for(url, Credentials::default());

        let err = client.fetch_page(3, 100).await.unwrap_err();
        server.await.unwrap();

        match err {
            ArchiverError::Enumeration(message) => {
                assert!(message.contains("403"));
                assert!(message.contains("rate limit"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_enumeration_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}", addr), Credentials::default());
        let result = client.fetch_page(1, 100).await;

        assert!(matches!(result, Err(ArchiverError::Enumeration(_))));
    }
}
