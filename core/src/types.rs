//! Domain types for backend projects and their experiments.
//!
//! # Design
//! Upstream payloads carry more fields than the client reads. Each type names
//! the fields callers rely on and keeps the remaining camelCase keys in
//! `extra`, so nothing the server sent is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The two kinds of project the backend manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "code-project")]
    CodeProject,
    #[serde(rename = "data-project")]
    DataProject,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::CodeProject => "code-project",
            ProjectType::DataProject => "data-project",
        }
    }

    /// Collection path segment, e.g. `data-projects`.
    pub fn collection(&self) -> String {
        format!("{}s", self.as_str())
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream identifier: an integer or an opaque string such as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Int(id) => write!(f, "{id}"),
            ResourceId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        ResourceId::Int(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::Text(id.to_string())
    }
}

/// An experiment nested under a data project.
///
/// Keys are camelCase; the identifier stays under `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeProject {
    pub backend_id: ResourceId,
    pub project_type: ProjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_scope: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProject {
    pub backend_id: ResourceId,
    pub project_type: ProjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_scope: Option<String>,
    /// In upstream order.
    #[serde(default)]
    pub experiments: Vec<Experiment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A normalized project of either kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Project {
    Code(CodeProject),
    Data(DataProject),
}

impl Project {
    pub fn backend_id(&self) -> &ResourceId {
        match self {
            Project::Code(p) => &p.backend_id,
            Project::Data(p) => &p.backend_id,
        }
    }

    pub fn project_type(&self) -> ProjectType {
        match self {
            Project::Code(p) => p.project_type,
            Project::Data(p) => p.project_type,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Project::Code(p) => p.name.as_deref(),
            Project::Data(p) => p.name.as_deref(),
        }
    }

    pub fn as_data(&self) -> Option<&DataProject> {
        match self {
            Project::Data(p) => Some(p),
            Project::Code(_) => None,
        }
    }
}

/// Body of the GitLab fork call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkRequest {
    pub id: i64,
    pub namespace: String,
    pub name: String,
}

/// One page of a paginated listing.
///
/// Bare JSON arrays are accepted too and read as a single, final page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub total_pages: Option<u32>,
    pub last: bool,
}

#[derive(Deserialize)]
struct PageEnvelope<T> {
    content: Vec<T>,
    #[serde(default)]
    number: u32,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    last: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
    Envelope(PageEnvelope<T>),
    Bare(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PageRepr::deserialize(deserializer)? {
            PageRepr::Bare(content) => Page {
                content,
                number: 0,
                total_pages: Some(1),
                last: true,
            },
            PageRepr::Envelope(env) => {
                let last = env.last.unwrap_or_else(|| match env.total_pages {
                    Some(total) => env.number.saturating_add(1) >= total,
                    None => env.content.is_empty(),
                });
                Page {
                    content: env.content,
                    number: env.number,
                    total_pages: env.total_pages,
                    last,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_type_wire_names() {
        assert_eq!(ProjectType::DataProject.as_str(), "data-project");
        assert_eq!(ProjectType::CodeProject.collection(), "code-projects");
        let json = serde_json::to_value(ProjectType::DataProject).unwrap();
        assert_eq!(json, "data-project");
    }

    #[test]
    fn resource_id_accepts_numbers_and_strings() {
        let int: ResourceId = serde_json::from_str("7").unwrap();
        assert_eq!(int, ResourceId::Int(7));
        let text: ResourceId = serde_json::from_str(r#""5d005488-afb6-4a0c-852a-f471153a04b5""#).unwrap();
        assert_eq!(text.to_string(), "5d005488-afb6-4a0c-852a-f471153a04b5");
    }

    #[test]
    fn bare_array_is_a_single_last_page() {
        let page: Page<Value> = serde_json::from_str(r#"[{"slug":"a"},{"slug":"b"}]"#).unwrap();
        assert_eq!(page.content.len(), 2);
        assert!(page.last);
    }

    #[test]
    fn envelope_derives_last_from_total_pages() {
        let page: Page<Value> =
            serde_json::from_str(r#"{"content":[{"slug":"a"}],"number":0,"total_pages":2}"#).unwrap();
        assert!(!page.last);
        let page: Page<Value> =
            serde_json::from_str(r#"{"content":[],"number":1,"total_pages":2}"#).unwrap();
        assert!(page.last);
    }

    #[test]
    fn page_number_at_u32_max_is_last() {
        let page: Page<Value> =
            serde_json::from_str(r#"{"content":[{"slug":"a"}],"number":4294967295,"total_pages":3}"#).unwrap();
        assert_eq!(page.number, u32::MAX);
        assert!(page.last);
    }

    #[test]
    fn explicit_last_flag_wins() {
        let page: Page<Value> =
            serde_json::from_str(r#"{"content":[1],"number":0,"total_pages":5,"last":true}"#).unwrap();
        assert!(page.last);
    }
}
