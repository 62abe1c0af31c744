use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_BACKEND_TOKEN: &str = "backend-token";
pub const DEFAULT_GITLAB_TOKEN: &str = "gitlab-token";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experiment {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub gitlab_id: i64,
    pub project_type: String,
    pub name: String,
    pub slug: String,
    pub gitlab_namespace: String,
    pub description: Option<String>,
    pub visibility_scope: String,
    pub experiments: Vec<Experiment>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub user_uuid: Uuid,
    pub username: String,
    pub access_level: u32,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub slug: String,
    pub namespace: String,
    pub description: Option<String>,
    #[serde(default = "private_scope")]
    pub visibility_scope: String,
    #[serde(default)]
    pub experiments: Vec<NewExperiment>,
}

#[derive(Deserialize)]
pub struct NewExperiment {
    pub name: String,
    pub slug: String,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility_scope: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMember {
    pub user_uuid: Option<Uuid>,
    pub username: String,
    #[serde(default = "developer_level")]
    pub access_level: u32,
}

#[derive(Deserialize)]
pub struct ForkProject {
    pub namespace: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

fn private_scope() -> String {
    "PRIVATE".to_string()
}

fn developer_level() -> u32 {
    30
}

/// Credentials the server accepts.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub backend_token: String,
    pub gitlab_token: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            backend_token: DEFAULT_BACKEND_TOKEN.to_string(),
            gitlab_token: DEFAULT_GITLAB_TOKEN.to_string(),
        }
    }
}

#[derive(Default)]
pub struct Store {
    projects: Vec<Project>,
    members: HashMap<i64, Vec<Member>>,
    next_id: i64,
}

impl Store {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn by_gitlab_id(&self, gitlab_id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.gitlab_id == gitlab_id)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Store>>,
    pub credentials: Arc<Credentials>,
}

pub fn app() -> Router {
    app_with(Credentials::default())
}

pub fn app_with(credentials: Credentials) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        credentials: Arc::new(credentials),
    };
    Router::new()
        .route("/api/v1/code-projects", get(list_code_projects).post(create_code_project))
        .route("/api/v1/data-projects", get(list_data_projects).post(create_data_project))
        .route("/api/v1/data-projects/{id}", put(update_project))
        .route("/api/v1/data-projects/{id}/users", get(list_members).post(add_member))
        .route(
            "/api/v1/data-projects/{id}/users/{user_uuid}",
            axum::routing::delete(remove_member),
        )
        .route("/api/v1/projects/public", get(list_public))
        .route("/api/v1/projects/slug/{slug}", get(projects_by_slug))
        .route("/api/v4/projects/{id}", get(gitlab_project).delete(gitlab_delete))
        .route("/api/v4/projects/{id}/fork", post(gitlab_fork))
        .route("/api/v4/projects/{id}/members", get(gitlab_members))
        .route("/api/v4/projects/{id}/users", get(gitlab_users))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Credentials::default()).await
}

pub async fn run_with(listener: TcpListener, credentials: Credentials) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock project API listening");
    }
    axum::serve(listener, app_with(credentials)).await
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn require_backend(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {}", state.credentials.backend_token);
    if header(headers, "authorization") == Some(expected.as_str()) {
        Ok(())
    } else {
        debug!("backend credentials missing or wrong");
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn require_gitlab(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    if header(headers, "private-token") == Some(state.credentials.gitlab_token.as_str()) {
        Ok(())
    } else {
        debug!("gitlab credentials missing or wrong");
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// The users listing is served to anonymous callers only, so a client that
/// leaks credentials into it is caught.
fn require_anonymous(headers: &HeaderMap) -> Result<(), StatusCode> {
    if headers.contains_key("authorization") || headers.contains_key("private-token") {
        Err(StatusCode::BAD_REQUEST)
    } else {
        Ok(())
    }
}

fn error_message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error_message": message }))).into_response()
}

// --- backend: projects ---

async fn list_code_projects(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<Project>>, StatusCode> {
    list_projects(state, headers, "code-project").await
}

async fn list_data_projects(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<Project>>, StatusCode> {
    list_projects(state, headers, "data-project").await
}

async fn list_projects(state: AppState, headers: HeaderMap, kind: &str) -> Result<Json<Vec<Project>>, StatusCode> {
    require_backend(&state, &headers)?;
    let db = state.db.read().await;
    Ok(Json(
        db.projects.iter().filter(|p| p.project_type == kind).cloned().collect(),
    ))
}

async fn create_code_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateProject>,
) -> Response {
    create_project(state, headers, input, "code-project").await
}

async fn create_data_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateProject>,
) -> Response {
    create_project(state, headers, input, "data-project").await
}

async fn create_project(state: AppState, headers: HeaderMap, input: CreateProject, kind: &str) -> Response {
    if let Err(status) = require_backend(&state, &headers) {
        return error_message(status, "Authentication required");
    }
    let mut db = state.db.write().await;
    let taken = db
        .projects
        .iter()
        .any(|p| p.slug == input.slug && p.gitlab_namespace == input.namespace);
    if taken {
        return error_message(StatusCode::CONFLICT, "Project with this slug already exists");
    }

    let id = db.allocate_id();
    let gitlab_id = 1000 + id;
    let mut experiments = Vec::new();
    for exp in input.experiments {
        let exp_id = db.allocate_id();
        experiments.push(Experiment {
            id: exp_id,
            name: exp.name,
            slug: exp.slug,
            status: "CREATED".to_string(),
        });
    }
    let project = Project {
        id,
        gitlab_id,
        project_type: kind.to_string(),
        name: input.name,
        slug: input.slug,
        gitlab_namespace: input.namespace,
        description: input.description,
        visibility_scope: input.visibility_scope,
        experiments,
    };
    db.projects.push(project.clone());
    info!(id, kind, "created project");
    (StatusCode::CREATED, Json(project)).into_response()
}

async fn update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProject>,
) -> Result<Json<Project>, StatusCode> {
    require_backend(&state, &headers)?;
    let mut db = state.db.write().await;
    let project = db
        .projects
        .iter_mut()
        .find(|p| p.id == id && p.project_type == "data-project")
        .ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        project.name = name;
    }
    if let Some(description) = input.description {
        project.description = Some(description);
    }
    if let Some(scope) = input.visibility_scope {
        project.visibility_scope = scope;
    }
    Ok(Json(project.clone()))
}

async fn list_public(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Json<Value> {
    let db = state.db.read().await;
    let public: Vec<&Project> = db
        .projects
        .iter()
        .filter(|p| p.visibility_scope == "PUBLIC")
        .collect();

    let Some(page) = query.page else {
        return Json(json!(public));
    };
    let size = query.size.unwrap_or(20).max(1) as usize;
    let total_pages = public.len().div_ceil(size).max(1);
    let last = page as usize + 1 >= total_pages;
    let content: Vec<&Project> = public.into_iter().skip(page as usize * size).take(size).collect();
    Json(json!({
        "content": content,
        "number": page,
        "size": size,
        "total_pages": total_pages,
        "last": last,
    }))
}

async fn projects_by_slug(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Project>>, StatusCode> {
    require_backend(&state, &headers)?;
    let db = state.db.read().await;
    Ok(Json(db.projects.iter().filter(|p| p.slug == slug).cloned().collect()))
}

// --- backend: members ---

fn data_project_exists(db: &Store, id: i64) -> bool {
    db.projects.iter().any(|p| p.id == id && p.project_type == "data-project")
}

async fn list_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Member>>, StatusCode> {
    require_backend(&state, &headers)?;
    let db = state.db.read().await;
    if !data_project_exists(&db, id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(db.members.get(&id).cloned().unwrap_or_default()))
}

async fn add_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<AddMember>,
) -> Result<Json<Vec<Member>>, StatusCode> {
    require_backend(&state, &headers)?;
    let mut db = state.db.write().await;
    if !data_project_exists(&db, id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let members = db.members.entry(id).or_default();
    members.push(Member {
        user_uuid: input.user_uuid.unwrap_or_else(Uuid::new_v4),
        username: input.username,
        access_level: input.access_level,
    });
    Ok(Json(members.clone()))
}

async fn remove_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, user_uuid)): Path<(i64, Uuid)>,
) -> Result<StatusCode, StatusCode> {
    require_backend(&state, &headers)?;
    let mut db = state.db.write().await;
    let members = db.members.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let before = members.len();
    members.retain(|m| m.user_uuid != user_uuid);
    if members.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- gitlab ---

fn gitlab_view(project: &Project) -> Value {
    json!({
        "id": project.gitlab_id,
        "name": project.name,
        "path": project.slug,
        "path_with_namespace": format!("{}/{}", project.gitlab_namespace, project.slug),
        "namespace": { "path": project.gitlab_namespace },
        "statistics": {
            "commit_count": 1,
            "repository_size": 0,
        },
    })
}

async fn gitlab_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    require_gitlab(&state, &headers)?;
    let db = state.db.read().await;
    db.by_gitlab_id(id)
        .map(|p| Json(gitlab_view(p)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn gitlab_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    require_gitlab(&state, &headers)?;
    let mut db = state.db.write().await;
    let index = db
        .projects
        .iter()
        .position(|p| p.gitlab_id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let removed = db.projects.remove(index);
    db.members.remove(&removed.id);
    Ok((StatusCode::ACCEPTED, Json(json!({ "message": "202 Accepted" }))))
}

async fn gitlab_fork(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ForkProject>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    require_gitlab(&state, &headers)?;
    let mut db = state.db.write().await;
    let source = db.by_gitlab_id(id).cloned().ok_or(StatusCode::NOT_FOUND)?;
    if db
        .projects
        .iter()
        .any(|p| p.gitlab_namespace == input.namespace && p.slug == source.slug)
    {
        return Err(StatusCode::CONFLICT);
    }
    let new_id = db.allocate_id();
    let fork = Project {
        id: new_id,
        gitlab_id: 1000 + new_id,
        name: input.name,
        gitlab_namespace: input.namespace,
        ..source
    };
    db.projects.push(fork.clone());
    let mut view = gitlab_view(&fork);
    view["forked_from_project"] = json!({ "id": id });
    Ok((StatusCode::CREATED, Json(view)))
}

async fn gitlab_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    require_gitlab(&state, &headers)?;
    let db = state.db.read().await;
    let project = db.by_gitlab_id(id).ok_or(StatusCode::NOT_FOUND)?;
    let members = db.members.get(&project.id).cloned().unwrap_or_default();
    Ok(Json(
        members
            .iter()
            .map(|m| json!({ "username": m.username, "access_level": m.access_level }))
            .collect(),
    ))
}

async fn gitlab_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    require_anonymous(&headers)?;
    let db = state.db.read().await;
    let project = db.by_gitlab_id(id).ok_or(StatusCode::NOT_FOUND)?;
    let members = db.members.get(&project.id).cloned().unwrap_or_default();
    Ok(Json(
        members
            .iter()
            .map(|m| json!({ "username": m.username, "name": m.username }))
            .collect(),
    ))
}
