//! Todo API tests against the in-memory task store.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::TimeDelta;
use serde_json::{Value, json};
use tasklane_core::TokenKeys;
use tasklane_todo::{TaskStore, TodoState, build_router};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn keys() -> TokenKeys {
    TokenKeys::with_ttl_minutes(SECRET, 30)
}

fn test_router() -> Router {
    build_router(TodoState {
        store: TaskStore::in_memory(),
        keys: keys(),
    })
}

fn bearer(username: &str) -> String {
    format!("Bearer {}", keys().issue(username).unwrap())
}

fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn task(title: &str) -> Value {
    json!({ "title": title, "description": "Descripción de prueba" })
}

async fn first_task_id(router: &Router, auth: &str) -> i64 {
    let (_, body) = send(router, request("GET", "/tasks", Some(auth), None)).await;
    body[0]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let router = test_router();
    let (status, body) = send(&router, request("GET", "/tasks", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token inválido");
}

#[tokio::test]
async fn foreign_signature_is_unauthorized() {
    let router = test_router();
    let forged = TokenKeys::with_ttl_minutes("other-secret", 30).issue("ana").unwrap();
    let auth = format!("Bearer {forged}");
    let (status, body) = send(&router, request("GET", "/tasks", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token inválido");
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let router = test_router();
    let expired = TokenKeys::new(SECRET, TimeDelta::seconds(-120)).issue("ana").unwrap();
    let auth = format!("Bearer {expired}");
    let (status, body) = send(&router, request("GET", "/tasks", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token expirado");
}

#[tokio::test]
async fn create_and_list_own_tasks() {
    let router = test_router();
    let ana = bearer("ana");

    let (status, body) = send(&router, request("POST", "/tasks", Some(&ana), Some(task("Mi")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tarea registrada");

    let (status, body) = send(&router, request("GET", "/tasks", Some(&ana), None)).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Mi");
    let mut fields: Vec<_> = tasks[0].as_object().unwrap().keys().cloned().collect();
    fields.sort();
    assert_eq!(fields, ["description", "id", "title"]);

    let (_, body) = send(&router, request("GET", "/tasks", Some(&bearer("luis")), None)).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_title_conflicts_per_user() {
    let router = test_router();
    let ana = bearer("ana");
    send(&router, request("POST", "/tasks", Some(&ana), Some(task("Mi")))).await;

    let (status, body) = send(&router, request("POST", "/tasks", Some(&ana), Some(task("Mi")))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Ya existe una tarea con ese título");

    let (status, _) = send(&router, request("POST", "/tasks", Some(&bearer("luis")), Some(task("Mi")))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_and_delete_own_task() {
    let router = test_router();
    let ana = bearer("ana");
    send(&router, request("POST", "/tasks", Some(&ana), Some(task("Mi")))).await;
    let id = first_task_id(&router, &ana).await;

    let uri = format!("/tasks/{id}");
    let (status, body) = send(&router, request("PUT", &uri, Some(&ana), Some(task("Nueva")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tarea actualizada");

    let (_, body) = send(&router, request("GET", "/tasks", Some(&ana), None)).await;
    assert_eq!(body[0]["title"], "Nueva");

    let (status, body) = send(&router, request("DELETE", &uri, Some(&ana), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tarea eliminada");

    let (status, body) = send(&router, request("DELETE", &uri, Some(&ana), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Tarea no encontrada");
}

#[tokio::test]
async fn other_users_task_is_not_found() {
    let router = test_router();
    let ana = bearer("ana");
    let luis = bearer("luis");
    send(&router, request("POST", "/tasks", Some(&ana), Some(task("Mi")))).await;
    let id = first_task_id(&router, &ana).await;
    let uri = format!("/tasks/{id}");

    let (status, _) = send(&router, request("PUT", &uri, Some(&luis), Some(task("Robada")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&router, request("DELETE", &uri, Some(&luis), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&router, request("GET", "/tasks", Some(&ana), None)).await;
    assert_eq!(body[0]["title"], "Mi");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let router = test_router();
    let ana = bearer("ana");
    let (status, body) = send(&router, request("PUT", "/tasks/999", Some(&ana), Some(task("x")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Tarea no encontrada");
}

#[tokio::test]
async fn id_beyond_column_range_is_not_found() {
    let router = test_router();
    let ana = bearer("ana");

    let (status, body) = send(&router, request("PUT", "/tasks/2147483648", Some(&ana), Some(task("x")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Tarea no encontrada");

    let (status, body) = send(&router, request("DELETE", "/tasks/2147483648", Some(&ana), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Tarea no encontrada");

    let (status, body) = send(&router, request("DELETE", "/tasks/-2147483649", Some(&ana), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Tarea no encontrada");
}

#[tokio::test]
async fn non_numeric_id_is_bad_request_with_detail() {
    let router = test_router();
    let ana = bearer("ana");
    let (status, body) = send(&router, request("DELETE", "/tasks/abc", Some(&ana), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn incomplete_body_is_bad_request_with_detail() {
    let router = test_router();
    let ana = bearer("ana");

    let (status, body) = send(&router, request("POST", "/tasks", Some(&ana), Some(json!({ "title": "Mi" })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("description"));

    let (_, body) = send(&router, request("GET", "/tasks", Some(&ana), None)).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn token_checked_before_path_and_body() {
    let router = test_router();
    let (status, body) = send(&router, request("PUT", "/tasks/abc", None, Some(json!({})))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token inválido");
}

#[tokio::test]
async fn healthz_needs_no_token() {
    let router = test_router();
    let resp = router
        .oneshot(request("GET", "/healthz", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
