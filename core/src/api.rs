//! One call per operation: resolve headers, build, execute, parse.
//!
//! `ProjectApi` pairs a `ProjectApiClient` with a `Transport`. Every method
//! is a single round-trip except [`ProjectApi::get_project_details_no_auth`],
//! which walks the paginated public listing.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{find_in_public_page, ProjectApiClient};
use crate::error::ApiError;
use crate::headers::{HeaderProvider, SessionHeaders};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Project, ProjectType};

/// Page size requested while scanning the public listing.
pub const PUBLIC_PAGE_SIZE: u32 = 100;

/// Upper bound on pages scanned by the unauthenticated slug lookup.
pub const MAX_PUBLIC_PAGES: u32 = 1000;

#[derive(Debug, Clone)]
pub struct ProjectApi<T, H = SessionHeaders> {
    client: ProjectApiClient<H>,
    transport: T,
}

impl<T: Transport, H: HeaderProvider> ProjectApi<T, H> {
    pub fn new(client: ProjectApiClient<H>, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &ProjectApiClient<H> {
        &self.client
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(&request)
    }

    pub fn create<B: Serialize + ?Sized>(
        &self,
        body: &B,
        project_type: ProjectType,
    ) -> Result<HttpResponse, ApiError> {
        let response = self.send(self.client.build_create(body, project_type)?)?;
        self.client.parse_create(response)
    }

    pub fn get_project_info(&self, project_id: impl Display) -> Result<Value, ApiError> {
        let response = self.send(self.client.build_get_project_info(project_id))?;
        self.client.parse_get_project_info(response)
    }

    pub fn get_projects_list(&self, project_type: ProjectType) -> Result<Vec<Project>, ApiError> {
        let response = self.send(self.client.build_get_projects_list(project_type))?;
        self.client.parse_get_projects_list(response, project_type)
    }

    pub fn list_public_projects(&self) -> Result<Value, ApiError> {
        let response = self.send(self.client.build_list_public_projects())?;
        self.client.parse_list_public_projects(response)
    }

    pub fn get_members(&self, project_id: impl Display) -> Result<Value, ApiError> {
        let response = self.send(self.client.build_get_members(project_id))?;
        self.client.parse_get_members(response)
    }

    pub fn add_member<B: Serialize + ?Sized>(
        &self,
        project_id: impl Display,
        form: &B,
    ) -> Result<Value, ApiError> {
        let response = self.send(self.client.build_add_member(project_id, form)?)?;
        self.client.parse_add_member(response)
    }

    pub fn remove_member(&self, project_id: impl Display, user_uuid: &str) -> Result<Value, ApiError> {
        let response = self.send(self.client.build_remove_member(project_id, user_uuid))?;
        self.client.parse_remove_member(response)
    }

    pub fn update_project_details<B: Serialize + ?Sized>(
        &self,
        project_id: impl Display,
        body: &B,
    ) -> Result<Value, ApiError> {
        let response = self.send(self.client.build_update_project_details(project_id, body)?)?;
        self.client.parse_update_project_details(response)
    }

    pub fn fork_project(&self, id: i64, namespace: &str, name: &str) -> Result<HttpResponse, ApiError> {
        let response = self.send(self.client.build_fork_project(id, namespace, name)?)?;
        self.client.parse_fork_project(response)
    }

    pub fn remove_project(&self, project_id: impl Display) -> Result<HttpResponse, ApiError> {
        let response = self.send(self.client.build_remove_project(project_id))?;
        self.client.parse_remove_project(response)
    }

    pub fn get_project_contributors(&self, project_id: impl Display) -> Result<HttpResponse, ApiError> {
        let response = self.send(self.client.build_get_project_contributors(project_id))?;
        self.client.parse_get_project_contributors(response)
    }

    pub fn get_users(&self, project_id: impl Display) -> Result<Value, ApiError> {
        let response = self.send(self.client.build_get_users(project_id))?;
        self.client.parse_get_users(response)
    }

    pub fn get_project_details(&self, namespace: &str, slug: &str) -> Result<Option<Value>, ApiError> {
        let response = self.send(self.client.build_get_project_details(slug))?;
        self.client.parse_get_project_details(response, namespace)
    }

    /// Scan the public listing page by page for `namespace`/`slug`.
    ///
    /// Stops at the first match, at the last page, or after
    /// `MAX_PUBLIC_PAGES` pages (logged as a warning). Every page is held in memory while it is
    /// scanned; there is no server-side lookup.
    pub fn get_project_details_no_auth(&self, namespace: &str, slug: &str) -> Result<Option<Value>, ApiError> {
        self.scan_public_pages(namespace, slug, MAX_PUBLIC_PAGES)
    }

    fn scan_public_pages(&self, namespace: &str, slug: &str, max_pages: u32) -> Result<Option<Value>, ApiError> {
        for number in 0..max_pages {
            let request = self.client.build_list_public_projects_page(number, PUBLIC_PAGE_SIZE);
            let page = self.client.parse_list_public_projects_page(self.send(request)?)?;
            let last = page.last || page.content.is_empty();
            if let Some(found) = find_in_public_page(page, namespace, slug) {
                debug!(page = number, "found public project");
                return Ok(Some(found));
            }
            if last {
                return Ok(None);
            }
        }
        warn!(
            pages = max_pages,
            namespace, slug, "public listing scan hit the page cap before the last page"
        );
        Ok(None)
    }
}
