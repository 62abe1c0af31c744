//! Response normalization: snake_case wire keys to camelCase domain objects.
//!
//! Key conversion is shallow. Nested objects keep their keys unless a step
//! converts them explicitly, as with a data project's experiments.

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ApiError;
use crate::types::{CodeProject, DataProject, Experiment, Project, ProjectType};

/// `gitlab_namespace` -> `gitlabNamespace`.
///
/// Leading underscores are kept, runs of underscores collapse, and the
/// character after an underscore is upper-cased.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            if out.chars().all(|o| o == '_') {
                out.push(c);
            } else {
                upper_next = true;
            }
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert the top-level keys of an object.
pub fn camelize_keys(object: Map<String, Value>) -> Map<String, Value> {
    object
        .into_iter()
        .map(|(key, value)| (to_camel_case(&key), value))
        .collect()
}

fn expect_object(value: Value, what: &str) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Deserialization(format!(
            "expected {what} object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn normalize_experiment(raw: Value) -> Result<Experiment, ApiError> {
    let object = camelize_keys(expect_object(raw, "experiment")?);
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Normalize one project: camelCase keys, `id` moved to `backendId`,
/// `projectType` set to `project_type` whatever the payload says, and for
/// data projects each experiment normalized in order.
///
/// A data project without an `experiments` array gets an empty list.
pub fn normalize_project(raw: Value, project_type: ProjectType) -> Result<Project, ApiError> {
    let mut object = camelize_keys(expect_object(raw, "project")?);

    let id = object
        .remove("id")
        .ok_or_else(|| ApiError::Deserialization("project is missing `id`".to_string()))?;
    object.insert("backendId".to_string(), id);
    object.insert(
        "projectType".to_string(),
        Value::String(project_type.as_str().to_string()),
    );

    match project_type {
        ProjectType::CodeProject => {
            let project: CodeProject = serde_json::from_value(Value::Object(object))?;
            Ok(Project::Code(project))
        }
        ProjectType::DataProject => {
            let experiments = match object.remove("experiments") {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .map(normalize_experiment)
                    .collect::<Result<Vec<_>, _>>()?,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(ApiError::Deserialization(format!(
                        "expected experiments array, got {}",
                        json_kind(&other)
                    )))
                }
            };
            let mut project: DataProject = serde_json::from_value(Value::Object(object))?;
            project.experiments = experiments;
            Ok(Project::Data(project))
        }
    }
}

/// Normalize a project listing.
pub fn normalize_projects(raw: Value, project_type: ProjectType) -> Result<Vec<Project>, ApiError> {
    let items = match raw {
        Value::Array(items) => items,
        other => {
            return Err(ApiError::Deserialization(format!(
                "expected project array, got {}",
                json_kind(&other)
            )))
        }
    };
    let projects = items
        .into_iter()
        .map(|item| normalize_project(item, project_type))
        .collect::<Result<Vec<_>, _>>()?;
    trace!(count = projects.len(), %project_type, "normalized projects");
    Ok(projects)
}
