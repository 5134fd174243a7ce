// file: src/models/repository.rs
// description: repository descriptor and source credentials
// reference: internal data structures

use crate::error::{ArchiverError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One repository of the organization, as reported by the source API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub clone_url: String,
}

impl RepositoryDescriptor {
    pub fn new(name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clone_url: clone_url.into(),
        }
    }
}

/// Source-control credentials. Used for API basic auth and embedded into clone endpoints.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: Option<String>) -> Self {
        Self {
            username: username.into(),
            token,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns the clone endpoint with `username:token@` in its authority.
    ///
    /// Endpoints are returned unchanged when no token is configured.
    pub fn embed_in(&self, endpoint: &str) -> Result<Url> {
        let mut url = Url::parse(endpoint).map_err(|e| {
            ArchiverError::Validation(format!("Invalid clone endpoint {}: {}", endpoint, e))
        })?;

        let Some(token) = self.token.as_deref().filter(|_| self.has_token()) else {
            return Ok(url);
        };

        let username = if self.username.is_empty() {
            "x-access-token"
        } else {
            self.username.as_str()
        };

        url.set_username(username)
            .and_then(|_| url.set_password(Some(token)))
            .map_err(|_| {
                ArchiverError::Validation(format!(
                    "Clone endpoint cannot carry credentials: {}",
                    endpoint
                ))
            })?;

        Ok(url)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
