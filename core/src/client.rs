//! Stateless request builder and response parser for the project APIs.
//!
//! # Design
//! `ProjectApiClient` holds the two origins and a `HeaderProvider`, and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes the matching `HttpResponse`. `ProjectApi` in `api.rs`
//! chains the two through a `Transport`.
//!
//! Success values follow three shapes:
//! - parsed JSON (`handle_json`): non-2xx rejects with the raw response,
//!   an empty body reads as `null`;
//! - the raw response (`check_ok`), for callers that inspect headers;
//! - normalized projects, for the typed project listing.
//!
//! Project creation is the one operation that rejects with the extracted
//! `error_message` instead of the raw response.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::headers::{HeaderProvider, ServiceTarget, SessionHeaders};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::normalize::normalize_projects;
use crate::types::{ForkRequest, Page, Project, ProjectType};

/// Key the public listing and slug endpoints use for the GitLab namespace.
const NAMESPACE_KEY: &str = "gitlab_namespace";
const SLUG_KEY: &str = "slug";

#[derive(Debug, Clone)]
pub struct ProjectApiClient<H = SessionHeaders> {
    base_url: String,
    gitlab_url: String,
    headers: H,
}

impl ProjectApiClient<SessionHeaders> {
    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(&config.base_url, config.session_headers());
        match &config.gitlab_url {
            Some(url) => client.with_gitlab_url(url),
            None => client,
        }
    }
}

impl<H: HeaderProvider> ProjectApiClient<H> {
    /// Both APIs are served from `base_url` until `with_gitlab_url` says
    /// otherwise. An empty `base_url` yields same-origin relative URLs.
    pub fn new(base_url: &str, headers: H) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            gitlab_url: base_url.clone(),
            base_url,
            headers,
        }
    }

    pub fn with_gitlab_url(mut self, gitlab_url: &str) -> Self {
        self.gitlab_url = gitlab_url.trim_end_matches('/').to_string();
        self
    }

    pub fn header_provider(&self) -> &H {
        &self.headers
    }

    fn url(&self, target: ServiceTarget, path: &str) -> String {
        match target {
            ServiceTarget::Backend => format!("{}{path}", self.base_url),
            ServiceTarget::Gitlab => format!("{}{path}", self.gitlab_url),
        }
    }

    fn authed(&self, method: HttpMethod, target: ServiceTarget, path: &str) -> HttpRequest {
        let req = HttpRequest::bodyless(method, self.headers.headers(target), self.url(target, path));
        debug!(method = method.as_str(), url = %req.url, ?target, "built request");
        req
    }

    fn authed_with_body<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        target: ServiceTarget,
        path: &str,
        body: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let req = HttpRequest::new(
            method,
            self.headers.headers(target),
            self.url(target, path),
            Some(body),
        );
        debug!(method = method.as_str(), url = %req.url, ?target, "built request");
        Ok(req)
    }

    /// Requests that must reach the server without credentials.
    fn anonymous(&self, target: ServiceTarget, path: &str) -> HttpRequest {
        let req = HttpRequest::bodyless(HttpMethod::Get, Vec::new(), self.url(target, path));
        debug!(url = %req.url, "built anonymous request");
        req
    }

    // -- fetchers ---------------------------------------------------------

    pub fn build_get_project_info(&self, project_id: impl Display) -> HttpRequest {
        self.authed(
            HttpMethod::Get,
            ServiceTarget::Gitlab,
            &format!("/api/v4/projects/{project_id}?statistics=true"),
        )
    }

    pub fn parse_get_project_info(&self, response: HttpResponse) -> Result<Value, ApiError> {
        handle_json(response)
    }

    pub fn build_get_projects_list(&self, project_type: ProjectType) -> HttpRequest {
        self.authed(
            HttpMethod::Get,
            ServiceTarget::Backend,
            &format!("/api/v1/{}", project_type.collection()),
        )
    }

    pub fn parse_get_projects_list(
        &self,
        response: HttpResponse,
        project_type: ProjectType,
    ) -> Result<Vec<Project>, ApiError> {
        let response = check_ok(response)?;
        let raw: Value = serde_json::from_str(&response.body)?;
        normalize_projects(raw, project_type)
    }

    pub fn build_list_public_projects(&self) -> HttpRequest {
        self.anonymous(ServiceTarget::Backend, "/api/v1/projects/public")
    }

    pub fn parse_list_public_projects(&self, response: HttpResponse) -> Result<Value, ApiError> {
        handle_json(response)
    }

    /// One page of the public listing. Pages are zero-based.
    pub fn build_list_public_projects_page(&self, page: u32, size: u32) -> HttpRequest {
        self.anonymous(
            ServiceTarget::Backend,
            &format!("/api/v1/projects/public?page={page}&size={size}"),
        )
    }

    pub fn parse_list_public_projects_page(&self, response: HttpResponse) -> Result<Page<Value>, ApiError> {
        let response = check_ok(response)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    pub fn build_get_members(&self, project_id: impl Display) -> HttpRequest {
        self.authed(
            HttpMethod::Get,
            ServiceTarget::Backend,
            &format!("/api/v1/data-projects/{project_id}/users"),
        )
    }

    pub fn parse_get_members(&self, response: HttpResponse) -> Result<Value, ApiError> {
        handle_json(response)
    }

    pub fn build_get_project_contributors(&self, project_id: impl Display) -> HttpRequest {
        self.authed(
            HttpMethod::Get,
            ServiceTarget::Gitlab,
            &format!("/api/v4/projects/{project_id}/members"),
        )
    }

    pub fn parse_get_project_contributors(&self, response: HttpResponse) -> Result<HttpResponse, ApiError> {
        check_ok(response)
    }

    /// Carries no headers at all, whatever the provider holds.
    pub fn build_get_users(&self, project_id: impl Display) -> HttpRequest {
        self.anonymous(ServiceTarget::Gitlab, &format!("/api/v4/projects/{project_id}/users"))
    }

    pub fn parse_get_users(&self, response: HttpResponse) -> Result<Value, ApiError> {
        handle_json(response)
    }

    // -- mutators ---------------------------------------------------------

    pub fn build_create<T: Serialize + ?Sized>(
        &self,
        body: &T,
        project_type: ProjectType,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_with_body(
            HttpMethod::Post,
            ServiceTarget::Backend,
            &format!("/api/v1/{}", project_type.collection()),
            body,
        )
    }

    /// Rejects with the body's `error_message` when present, otherwise with
    /// the raw response. A non-JSON failure body is a deserialization error.
    pub fn parse_create(&self, response: HttpResponse) -> Result<HttpResponse, ApiError> {
        if response.is_ok() {
            return Ok(response);
        }
        let body: Value = serde_json::from_str(&response.body)?;
        match body.get("error_message").and_then(Value::as_str) {
            Some(message) => Err(ApiError::Message {
                status: response.status,
                message: message.to_string(),
            }),
            None => Err(ApiError::Status(response)),
        }
    }

    pub fn build_add_member<T: Serialize + ?Sized>(
        &self,
        project_id: impl Display,
        form: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_with_body(
            HttpMethod::Post,
            ServiceTarget::Backend,
            &format!("/api/v1/data-projects/{project_id}/users"),
            form,
        )
    }

    pub fn parse_add_member(&self, response: HttpResponse) -> Result<Value, ApiError> {
        handle_json(response)
    }

    pub fn build_remove_member(&self, project_id: impl Display, user_uuid: &str) -> HttpRequest {
        self.authed(
            HttpMethod::Delete,
            ServiceTarget::Backend,
            &format!("/api/v1/data-projects/{project_id}/users/{user_uuid}"),
        )
    }

    pub fn parse_remove_member(&self, response: HttpResponse) -> Result<Value, ApiError> {
        handle_json(response)
    }

    pub fn build_update_project_details<T: Serialize + ?Sized>(
        &self,
        project_id: impl Display,
        body: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_with_body(
            HttpMethod::Put,
            ServiceTarget::Backend,
            &format!("/api/v1/data-projects/{project_id}"),
            body,
        )
    }

    pub fn parse_update_project_details(&self, response: HttpResponse) -> Result<Value, ApiError> {
        handle_json(response)
    }

    /// Fork project `id` into `namespace` under `name`.
    pub fn build_fork_project(&self, id: i64, namespace: &str, name: &str) -> Result<HttpRequest, ApiError> {
        let body = ForkRequest {
            id,
            namespace: namespace.to_string(),
            name: name.to_string(),
        };
        self.authed_with_body(
            HttpMethod::Post,
            ServiceTarget::Gitlab,
            &format!("/api/v4/projects/{id}/fork"),
            &body,
        )
    }

    pub fn parse_fork_project(&self, response: HttpResponse) -> Result<HttpResponse, ApiError> {
        check_ok(response)
    }

    pub fn build_remove_project(&self, project_id: impl Display) -> HttpRequest {
        self.authed(
            HttpMethod::Delete,
            ServiceTarget::Gitlab,
            &format!("/api/v4/projects/{project_id}"),
        )
    }

    pub fn parse_remove_project(&self, response: HttpResponse) -> Result<HttpResponse, ApiError> {
        check_ok(response)
    }

    // -- slug lookup ------------------------------------------------------

    pub fn build_get_project_details(&self, slug: &str) -> HttpRequest {
        self.authed(
            HttpMethod::Get,
            ServiceTarget::Backend,
            &format!("/api/v1/projects/slug/{slug}"),
        )
    }

    /// First element of the slug listing whose namespace is `namespace`.
    ///
    /// The scan is linear over whatever the server returned.
    pub fn parse_get_project_details(
        &self,
        response: HttpResponse,
        namespace: &str,
    ) -> Result<Option<Value>, ApiError> {
        let results = match handle_json(response)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(ApiError::Deserialization(format!(
                    "expected project array, got {other}"
                )))
            }
        };
        Ok(results
            .into_iter()
            .find(|item| field_eq(item, NAMESPACE_KEY, namespace)))
    }

    /// Single-response form of the unauthenticated lookup: scans one
    /// public listing response, bare or paginated.
    pub fn parse_get_project_details_no_auth(
        &self,
        response: HttpResponse,
        namespace: &str,
        slug: &str,
    ) -> Result<Option<Value>, ApiError> {
        let page = self.parse_list_public_projects_page(response)?;
        Ok(find_in_public_page(page, namespace, slug))
    }
}

/// First project on `page` matching both `namespace` and `slug`.
pub fn find_in_public_page(page: Page<Value>, namespace: &str, slug: &str) -> Option<Value> {
    page.content
        .into_iter()
        .filter(|item| field_eq(item, NAMESPACE_KEY, namespace))
        .find(|item| field_eq(item, SLUG_KEY, slug))
}

fn field_eq(item: &Value, key: &str, expected: &str) -> bool {
    item.get(key).and_then(Value::as_str) == Some(expected)
}

/// Reject any non-2xx response with the raw response.
fn check_ok(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_ok() {
        Ok(response)
    } else {
        debug!(status = response.status, "rejecting non-ok response");
        Err(ApiError::Status(response))
    }
}

/// Reject non-2xx, then parse the body. An empty body is `null`.
fn handle_json(response: HttpResponse) -> Result<Value, ApiError> {
    let response = check_ok(response)?;
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&response.body)?)
}
