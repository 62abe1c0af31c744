use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Member, Project, DEFAULT_BACKEND_TOKEN, DEFAULT_GITLAB_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn backend(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_BACKEND_TOKEN}"))
        .body(body.to_string())
        .unwrap()
}

fn gitlab(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("private-token", DEFAULT_GITLAB_TOKEN)
        .body(body.to_string())
        .unwrap()
}

fn anonymous(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

async fn create(app: &Router, kind: &str, body: &str) -> Project {
    let resp = app
        .clone()
        .oneshot(backend("POST", &format!("/api/v1/{kind}"), body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn backend_routes_require_bearer_token() {
    let resp = app().oneshot(anonymous("/api/v1/data-projects")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn backend_routes_reject_gitlab_token() {
    let resp = app()
        .oneshot(gitlab("GET", "/api/v1/code-projects", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gitlab_routes_reject_bearer_token() {
    let resp = app()
        .oneshot(backend("GET", "/api/v4/projects/1001", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- create ---

#[tokio::test]
async fn create_data_project_returns_201() {
    let app = app();
    let project = create(
        &app,
        "data-projects",
        r#"{"name":"Sign Language","slug":"sign-language","namespace":"alice","experiments":[{"name":"baseline","slug":"baseline"}]}"#,
    )
    .await;
    assert_eq!(project.project_type, "data-project");
    assert_eq!(project.experiments.len(), 1);
    assert_eq!(project.visibility_scope, "PRIVATE");
}

#[tokio::test]
async fn create_duplicate_slug_returns_error_message() {
    let app = app();
    let body = r#"{"name":"A","slug":"a","namespace":"ns"}"#;
    create(&app, "code-projects", body).await;

    let resp = app
        .clone()
        .oneshot(backend("POST", "/api/v1/code-projects", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let json: Value = body_json(resp).await;
    assert_eq!(json["error_message"], "Project with this slug already exists");
}

#[tokio::test]
async fn create_malformed_json_returns_422() {
    let resp = app()
        .oneshot(backend("POST", "/api/v1/data-projects", r#"{"name":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- listings ---

#[tokio::test]
async fn list_filters_by_project_type() {
    let app = app();
    create(&app, "code-projects", r#"{"name":"C","slug":"c","namespace":"ns"}"#).await;
    create(&app, "data-projects", r#"{"name":"D","slug":"d","namespace":"ns"}"#).await;

    let resp = app
        .clone()
        .oneshot(backend("GET", "/api/v1/code-projects", ""))
        .await
        .unwrap();
    let projects: Vec<Project> = body_json(resp).await;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].slug, "c");
}

#[tokio::test]
async fn public_listing_paginates_when_asked() {
    let app = app();
    for i in 0..3 {
        create(
            &app,
            "data-projects",
            &format!(r#"{{"name":"P{i}","slug":"p{i}","namespace":"ns","visibility_scope":"PUBLIC"}}"#),
        )
        .await;
    }
    create(&app, "data-projects", r#"{"name":"Hidden","slug":"h","namespace":"ns"}"#).await;

    let resp = app.clone().oneshot(anonymous("/api/v1/projects/public")).await.unwrap();
    let all: Vec<Project> = body_json(resp).await;
    assert_eq!(all.len(), 3);

    let resp = app
        .clone()
        .oneshot(anonymous("/api/v1/projects/public?page=1&size=2"))
        .await
        .unwrap();
    let page: Value = body_json(resp).await;
    assert_eq!(page["content"].as_array().unwrap().len(), 1);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["last"], true);
}

#[tokio::test]
async fn slug_lookup_returns_every_namespace() {
    let app = app();
    create(&app, "data-projects", r#"{"name":"A","slug":"same","namespace":"alice"}"#).await;
    create(&app, "data-projects", r#"{"name":"B","slug":"same","namespace":"bob"}"#).await;

    let resp = app
        .clone()
        .oneshot(backend("GET", "/api/v1/projects/slug/same", ""))
        .await
        .unwrap();
    let projects: Vec<Project> = body_json(resp).await;
    assert_eq!(projects.len(), 2);
}

// --- members ---

#[tokio::test]
async fn member_lifecycle() {
    let app = app();
    let project = create(&app, "data-projects", r#"{"name":"A","slug":"a","namespace":"ns"}"#).await;
    let uuid = "5d005488-afb6-4a0c-852a-f471153a04b5";

    let resp = app
        .clone()
        .oneshot(backend(
            "POST",
            &format!("/api/v1/data-projects/{}/users", project.id),
            &format!(r#"{{"user_uuid":"{uuid}","username":"bob"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let members: Vec<Member> = body_json(resp).await;
    assert_eq!(members.len(), 1);

    let resp = app
        .clone()
        .oneshot(backend(
            "DELETE",
            &format!("/api/v1/data-projects/{}/users/{uuid}", project.id),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app
        .clone()
        .oneshot(backend("GET", &format!("/api/v1/data-projects/{}/users", project.id), ""))
        .await
        .unwrap();
    let members: Vec<Member> = body_json(resp).await;
    assert!(members.is_empty());
}

#[tokio::test]
async fn members_of_unknown_project_is_404() {
    let resp = app()
        .oneshot(backend("GET", "/api/v1/data-projects/99/users", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- gitlab ---

#[tokio::test]
async fn gitlab_project_includes_statistics() {
    let app = app();
    let project = create(&app, "code-projects", r#"{"name":"A","slug":"a","namespace":"ns"}"#).await;

    let resp = app
        .clone()
        .oneshot(gitlab(
            "GET",
            &format!("/api/v4/projects/{}?statistics=true", project.gitlab_id),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    assert_eq!(json["path_with_namespace"], "ns/a");
    assert!(json["statistics"].is_object());
}

#[tokio::test]
async fn users_route_refuses_credentials() {
    let app = app();
    let project = create(&app, "data-projects", r#"{"name":"A","slug":"a","namespace":"ns"}"#).await;
    let uri = format!("/api/v4/projects/{}/users", project.gitlab_id);

    let resp = app.clone().oneshot(anonymous(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(gitlab("GET", &uri, "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fork_then_delete() {
    let app = app();
    let project = create(&app, "data-projects", r#"{"name":"A","slug":"a","namespace":"alice"}"#).await;

    let resp = app
        .clone()
        .oneshot(gitlab(
            "POST",
            &format!("/api/v4/projects/{}/fork", project.gitlab_id),
            &format!(r#"{{"id":{},"namespace":"bob","name":"A copy"}}"#, project.gitlab_id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let fork: Value = body_json(resp).await;
    assert_eq!(fork["path_with_namespace"], "bob/a");
    let fork_id = fork["id"].as_i64().unwrap();

    let resp = app
        .clone()
        .oneshot(gitlab("DELETE", &format!("/api/v4/projects/{fork_id}"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let resp = app
        .clone()
        .oneshot(gitlab("DELETE", &format!("/api/v4/projects/{fork_id}"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_drops_the_project_members() {
    let app = app();
    let project = create(&app, "data-projects", r#"{"name":"A","slug":"a","namespace":"alice"}"#).await;
    let uuid = "5d005488-afb6-4a0c-852a-f471153a04b5";
    let members_uri = format!("/api/v1/data-projects/{}/users", project.id);

    let resp = app
        .clone()
        .oneshot(backend(
            "POST",
            &members_uri,
            &format!(r#"{{"user_uuid":"{uuid}","username":"bob"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(gitlab("DELETE", &format!("/api/v4/projects/{}", project.gitlab_id), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    // The membership went with the project, so removing it again finds nothing.
    let resp = app
        .clone()
        .oneshot(backend("DELETE", &format!("{members_uri}/{uuid}"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.clone().oneshot(backend("GET", &members_uri, "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
