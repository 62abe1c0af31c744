//! Client configuration.
//!
//! Values come from the caller (deserialized from any serde source) or from
//! the process environment via [`ClientConfig::from_env`].

use serde::Deserialize;
use thiserror::Error;

use crate::headers::SessionHeaders;

pub const ENV_BASE_URL: &str = "PROJECT_API_BASE_URL";
pub const ENV_GITLAB_URL: &str = "PROJECT_API_GITLAB_URL";
pub const ENV_BACKEND_TOKEN: &str = "PROJECT_API_BACKEND_TOKEN";
pub const ENV_GITLAB_TOKEN: &str = "PROJECT_API_GITLAB_TOKEN";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Origin serving `/api/v1/...`, and `/api/v4/...` unless `gitlab_url` is set.
    pub base_url: String,
    /// Separate origin for the GitLab API.
    #[serde(default)]
    pub gitlab_url: Option<String>,
    #[serde(default)]
    pub backend_token: Option<String>,
    #[serde(default)]
    pub gitlab_token: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("gitlab_url", &self.gitlab_url)
            .field("backend_token", &self.backend_token.as_ref().map(|_| "<redacted>"))
            .field("gitlab_token", &self.gitlab_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            gitlab_url: None,
            backend_token: None,
            gitlab_token: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            base_url: get(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?,
            gitlab_url: get(ENV_GITLAB_URL),
            backend_token: get(ENV_BACKEND_TOKEN),
            gitlab_token: get(ENV_GITLAB_TOKEN),
        })
    }

    pub fn session_headers(&self) -> SessionHeaders {
        SessionHeaders::new(self.backend_token.clone(), self.gitlab_token.clone())
    }
}
