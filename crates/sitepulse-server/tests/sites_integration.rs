use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sitepulse_core::config::{ClassifierKind, Config};
use sitepulse_duckdb::DuckDbBackend;
use sitepulse_server::app::build_app;
use sitepulse_server::auth::jwt::encode_jwt;
use sitepulse_server::state::AppState;

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/sitepulse-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        jwt_secret: Some(SECRET.to_string()),
        token_days: 7,
        cors_origins: vec![],
        ua_classifier: ClassifierKind::Heuristic,
    }
}

fn setup() -> (Arc<AppState>, axum::Router) {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config()));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

fn bearer(user: &str) -> String {
    let (token, _) = encode_jwt(SECRET, user, 1).expect("token");
    format!("Bearer {token}")
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn create_request(user: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/create-site/")
        .header("content-type", "application/json")
        .header("authorization", bearer(user))
        .body(Body::from(body.to_string()))
        .expect("build request")
}

fn list_request(user: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/sites/")
        .header("authorization", bearer(user))
        .body(Body::empty())
        .expect("build request")
}

fn delete_request(user: &str, site_id: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(format!("/api/sites/{site_id}/"))
        .header("authorization", bearer(user))
        .body(Body::empty())
        .expect("build request")
}

#[tokio::test]
async fn create_site_returns_public_fields() {
    let (_state, app) = setup();
    let response = app
        .oneshot(create_request("alice", json!({ "domain": "example.com" })))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    let site_id = json["site_id"].as_str().expect("site_id");
    assert_eq!(site_id, site_id.to_lowercase());
    assert_eq!(json["domain"], "example.com");
    assert!(json["created_at"].is_string());
    assert!(json.get("owner").is_none());
}

#[tokio::test]
async fn create_site_requires_domain() {
    let (_state, app) = setup();
    for body in [json!({}), json!({ "domain": "  " })] {
        let response = app
            .clone()
            .oneshot(create_request("alice", body))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
        assert_eq!(json["error"]["field"], "domain");
    }
}

#[tokio::test]
async fn list_shows_only_the_callers_sites() {
    let (state, app) = setup();
    state.metadata.create_site("alice", "a.com").await.expect("site");
    state.metadata.create_site("alice", "b.com").await.expect("site");
    state.metadata.create_site("bob", "c.com").await.expect("site");

    let response = app.clone().oneshot(list_request("alice")).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let domains: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|s| s["domain"].as_str())
        .collect();
    assert_eq!(domains.len(), 2);
    assert!(domains.contains(&"a.com") && domains.contains(&"b.com"));

    let response = app.oneshot(list_request("carol")).await.expect("request");
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn owner_can_delete_site() {
    let (state, app) = setup();
    let site = state.metadata.create_site("alice", "a.com").await.expect("site");

    let response = app
        .oneshot(delete_request("alice", &site.site_id))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!state.metadata.site_exists(&site.site_id).await.expect("exists"));
}

#[tokio::test]
async fn deleting_someone_elses_or_missing_site_is_not_allowed() {
    let (state, app) = setup();
    let site = state.metadata.create_site("alice", "a.com").await.expect("site");

    for (user, id) in [("bob", site.site_id.as_str()), ("alice", "nope")] {
        let response = app
            .clone()
            .oneshot(delete_request(user, id))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await, json!({ "error": "not allowed" }));
    }
    assert!(state.metadata.site_exists(&site.site_id).await.expect("exists"));
}

#[tokio::test]
async fn site_routes_require_a_valid_token() {
    let (_state, app) = setup();

    let missing = Request::builder()
        .uri("/api/sites/")
        .body(Body::empty())
        .expect("build request");
    let response = app.clone().oneshot(missing).await.expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (forged, _) = encode_jwt("another-secret", "alice", 1).expect("token");
    let bad = Request::builder()
        .uri("/api/sites/")
        .header("authorization", format!("Bearer {forged}"))
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(bad).await.expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn generated_secret_is_used_when_none_is_configured() {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let mut config = test_config();
    config.jwt_secret = None;
    let state = Arc::new(AppState::new(db, config));
    let app = build_app(Arc::clone(&state));

    let secret = state.jwt_secret().await.expect("secret");
    assert_ne!(secret, SECRET);
    let (token, _) = encode_jwt(&secret, "alice", 1).expect("token");
    let request = Request::builder()
        .uri("/api/sites/")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}
