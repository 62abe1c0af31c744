//! Header resolution per upstream service.

use serde::{Deserialize, Serialize};

/// Which upstream API a request targets, and therefore which credentials it
/// may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTarget {
    /// The internal backend (`/api/v1/...`).
    Backend,
    /// The GitLab-compatible API (`/api/v4/...`).
    Gitlab,
}

/// Supplies the header set for a service target.
///
/// Implementations must only return credentials that belong to `target`.
pub trait HeaderProvider {
    fn headers(&self, target: ServiceTarget) -> Vec<(String, String)>;
}

pub const CONTENT_TYPE: &str = "content-type";
pub const AUTHORIZATION: &str = "authorization";
pub const PRIVATE_TOKEN: &str = "private-token";

/// Token-backed provider: bearer token for the backend, `private-token` for
/// GitLab. A missing token omits its header.
#[derive(Clone, Default)]
pub struct SessionHeaders {
    pub backend_token: Option<String>,
    pub gitlab_token: Option<String>,
}

impl SessionHeaders {
    pub fn new(backend_token: Option<String>, gitlab_token: Option<String>) -> Self {
        Self {
            backend_token,
            gitlab_token,
        }
    }
}

impl std::fmt::Debug for SessionHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHeaders")
            .field("backend_token", &self.backend_token.as_ref().map(|_| "<redacted>"))
            .field("gitlab_token", &self.gitlab_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HeaderProvider for SessionHeaders {
    fn headers(&self, target: ServiceTarget) -> Vec<(String, String)> {
        let mut headers = vec![(CONTENT_TYPE.to_string(), "application/json".to_string())];
        match target {
            ServiceTarget::Backend => {
                if let Some(token) = &self.backend_token {
                    headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
                }
            }
            ServiceTarget::Gitlab => {
                if let Some(token) = &self.gitlab_token {
                    headers.push((PRIVATE_TOKEN.to_string(), token.clone()));
                }
            }
        }
        headers
    }
}

impl<P: HeaderProvider + ?Sized> HeaderProvider for &P {
    fn headers(&self, target: ServiceTarget) -> Vec<(String, String)> {
        (**self).headers(target)
    }
}

impl<P: HeaderProvider + ?Sized> HeaderProvider for std::sync::Arc<P> {
    fn headers(&self, target: ServiceTarget) -> Vec<(String, String)> {
        (**self).headers(target)
    }
}
