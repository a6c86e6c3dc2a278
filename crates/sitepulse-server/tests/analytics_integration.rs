use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sitepulse_core::analytics::AnalyticsBackend;
use sitepulse_core::classify::HeuristicClassifier;
use sitepulse_core::config::{ClassifierKind, Config};
use sitepulse_core::event::Event;
use sitepulse_duckdb::DuckDbBackend;
use sitepulse_server::app::build_app;
use sitepulse_server::auth::jwt::encode_jwt;
use sitepulse_server::metadata::duckdb::DuckDbMetadataStore;
use sitepulse_server::state::AppState;

const SECRET: &str = "test-secret";
const MARCH: &str = "start=2026-03-01T00:00:00Z&end=2026-03-31T23:59:59Z";
const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";

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

/// Fresh app with one site owned by `alice`.
async fn setup() -> (Arc<AppState>, axum::Router, String) {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config()));
    let site = state
        .metadata
        .create_site("alice", "example.com")
        .await
        .expect("create site");
    let app = build_app(Arc::clone(&state));
    (state, app, site.site_id)
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
}

fn event(site_id: &str, session_id: &str, url: &str, ts: DateTime<Utc>) -> Event {
    Event {
        id: uuid::Uuid::new_v4().to_string(),
        site_id: site_id.to_string(),
        event_type: "pageview".to_string(),
        url: url.to_string(),
        referrer: None,
        utm_source: None,
        user_agent: None,
        language: None,
        screen_width: None,
        screen_height: None,
        session_id: session_id.to_string(),
        ip_address: None,
        country: None,
        timestamp: ts,
    }
}

async fn insert(state: &AppState, events: &[Event]) {
    for e in events {
        assert!(state.analytics.insert_event(e).await.expect("insert"));
    }
}

async fn get(app: &axum::Router, user: &str, uri: &str) -> (StatusCode, Value) {
    let (token, _) = encode_jwt(SECRET, user, 1).expect("token");
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn pages_report_trend_and_top_pages() {
    let (state, app, site) = setup().await;
    insert(
        &state,
        &[
            event(&site, "a", "/", at(10, 9, 0)),
            event(&site, "a", "/", at(10, 9, 1)),
            event(&site, "b", "/", at(10, 12, 0)),
            event(&site, "b", "/a", at(10, 12, 5)),
            event(&site, "c", "/a", at(11, 8, 0)),
            // Outside the window.
            event(&site, "d", "/old", Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
        ],
    )
    .await;

    let (status, json) = get(&app, "alice", &format!("/analytics/pages/{site}/?{MARCH}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["trend"],
        json!([
            { "date": "2026-03-10", "views": 4 },
            { "date": "2026-03-11", "views": 1 },
        ])
    );
    assert_eq!(
        json["top_pages"],
        json!([
            { "url": "/", "views": 3 },
            { "url": "/a", "views": 2 },
        ])
    );
}

#[tokio::test]
async fn sessions_report_duration_and_event_count() {
    let (state, app, site) = setup().await;
    insert(
        &state,
        &[
            event(&site, "S1", "/", at(10, 9, 0)),
            event(&site, "S1", "/a", at(10, 9, 5)),
            event(&site, "S1", "/b", at(10, 9, 10)),
        ],
    )
    .await;

    let (status, json) = get(&app, "alice", &format!("/analytics/sessions/{site}/?{MARCH}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_count"], 1);
    assert_eq!(json["avg_duration_seconds"], 600.0);
    assert_eq!(json["trend"], json!([{ "date": "2026-03-10", "sessions": 1 }]));
    assert_eq!(json["sessions"][0]["session_id"], "S1");
    assert_eq!(json["sessions"][0]["duration"], 600);
    assert_eq!(json["sessions"][0]["events"], 3);
}

#[tokio::test]
async fn empty_window_has_zero_average() {
    let (_state, app, site) = setup().await;
    let (status, json) = get(&app, "alice", &format!("/analytics/sessions/{site}/?{MARCH}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_count"], 0);
    assert_eq!(json["avg_duration_seconds"], 0.0);
    assert_eq!(json["sessions"], json!([]));
}

#[tokio::test]
async fn new_vs_returning_uses_first_ever_event() {
    let (state, app, site) = setup().await;
    insert(
        &state,
        &[
            event(&site, "old", "/", Utc.with_ymd_and_hms(2026, 2, 20, 10, 0, 0).unwrap()),
            event(&site, "old", "/", at(10, 10, 0)),
            event(&site, "fresh", "/", at(12, 10, 0)),
        ],
    )
    .await;

    let (status, json) = get(
        &app,
        "alice",
        &format!("/analytics/new-vs-returning/{site}/?{MARCH}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["new"], 1);
    assert_eq!(json["returning"], 1);
    assert_eq!(
        json["daily"],
        json!([
            { "date": "2026-03-10", "new_sessions": 0, "returning_sessions": 1 },
            { "date": "2026-03-12", "new_sessions": 1, "returning_sessions": 0 },
        ])
    );
}

#[tokio::test]
async fn sources_prefer_utm_then_referrer_host() {
    let (state, app, site) = setup().await;
    let mut google = event(&site, "a", "/", at(10, 9, 0));
    google.utm_source = Some("Google".to_string());
    let mut twitter = event(&site, "b", "/", at(10, 9, 0));
    twitter.referrer = Some("https://twitter.com/x".to_string());
    insert(&state, &[google, twitter]).await;

    let (status, json) = get(&app, "alice", &format!("/analytics/sources/{site}/?{MARCH}")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&json!({ "source": "google", "count": 1 })));
    assert!(rows.contains(&json!({ "source": "twitter.com", "count": 1 })));
}

#[tokio::test]
async fn devices_always_list_all_five_classes() {
    let (state, app, site) = setup().await;
    let mut phone = event(&site, "a", "/", at(10, 9, 0));
    phone.user_agent = Some(IPHONE.to_string());
    insert(&state, &[phone]).await;

    let (status, json) = get(&app, "alice", &format!("/analytics/devices/{site}/?{MARCH}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            { "device": "mobile", "count": 1 },
            { "device": "desktop", "count": 0 },
            { "device": "tablet", "count": 0 },
            { "device": "bot", "count": 0 },
            { "device": "unknown", "count": 0 },
        ])
    );
}

#[tokio::test]
async fn browsers_and_geography_rank_by_count() {
    let (state, app, site) = setup().await;
    let mut first = event(&site, "a", "/", at(10, 9, 0));
    first.user_agent = Some(IPHONE.to_string());
    first.country = Some("India".to_string());
    let mut second = event(&site, "a", "/", at(10, 9, 1));
    second.user_agent = Some(IPHONE.to_string());
    second.country = Some("India".to_string());
    let third = event(&site, "b", "/", at(10, 9, 2));
    insert(&state, &[first, second, third]).await;

    let (_, browsers) = get(&app, "alice", &format!("/analytics/browsers/{site}/?{MARCH}")).await;
    assert_eq!(
        browsers,
        json!([
            { "browser": "Safari", "count": 2 },
            { "browser": "other", "count": 1 },
        ])
    );

    let (_, geography) = get(&app, "alice", &format!("/analytics/geography/{site}/?{MARCH}")).await;
    assert_eq!(
        geography,
        json!([
            { "country": "India", "count": 2 },
            { "country": "Unknown", "count": 1 },
        ])
    );
}

#[tokio::test]
async fn kpis_with_comparison_attach_previous_window() {
    let (state, app, site) = setup().await;
    let mut current = vec![
        event(&site, "a", "/", at(12, 9, 0)),
        event(&site, "b", "/", at(13, 9, 0)),
        event(&site, "c", "/", at(14, 9, 0)),
    ];
    for e in &mut current {
        e.country = Some("UK".to_string());
    }
    insert(&state, &current).await;
    insert(&state, &[event(&site, "d", "/", at(5, 9, 0))]).await;

    let range = "start=2026-03-11T00:00:00Z&end=2026-03-21T00:00:00Z";
    let (status, json) = get(
        &app,
        "alice",
        &format!("/analytics/kpis/{site}/?{range}&compare=true"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sessions"], 3);
    assert_eq!(json["users"], 3);
    assert_eq!(json["page_views"], 3);
    assert_eq!(json["top_country"], "UK");
    assert_eq!(json["previous"]["sessions"], 1);
    assert_eq!(json["previous"]["top_country"], "Unknown");
    assert_eq!(json["change"]["sessions"], 200.0);

    let (_, plain) = get(&app, "alice", &format!("/analytics/kpis/{site}/?{range}")).await;
    assert_eq!(plain["sessions"], 3);
    assert!(plain.get("previous").is_none());
    assert!(plain.get("change").is_none());
}

#[tokio::test]
async fn segment_parameters_narrow_the_events() {
    let (state, app, site) = setup().await;
    let mut from_google = event(&site, "a", "/blog/rust", at(10, 9, 0));
    from_google.utm_source = Some("google".to_string());
    let mut from_twitter = event(&site, "b", "/blog/go", at(10, 9, 0));
    from_twitter.utm_source = Some("twitter".to_string());
    let mut docs = event(&site, "c", "/docs/install", at(10, 9, 0));
    docs.utm_source = Some("Google".to_string());
    insert(&state, &[from_google, from_twitter, docs]).await;

    let (_, by_service) = get(
        &app,
        "alice",
        &format!("/analytics/kpis/{site}/?{MARCH}&services=GOOGLE"),
    )
    .await;
    assert_eq!(by_service["page_views"], 2);

    let (_, by_post) = get(
        &app,
        "alice",
        &format!("/analytics/kpis/{site}/?{MARCH}&posts=/blog"),
    )
    .await;
    assert_eq!(by_post["page_views"], 2);

    let (_, both) = get(
        &app,
        "alice",
        &format!("/analytics/kpis/{site}/?{MARCH}&services=google&posts=/blog"),
    )
    .await;
    assert_eq!(both["page_views"], 1);
}

#[tokio::test]
async fn trailing_days_and_presets_resolve_against_now() {
    let (state, app, site) = setup().await;
    let now = Utc::now();
    insert(
        &state,
        &[
            event(&site, "recent", "/", now - Duration::days(2)),
            event(&site, "older", "/", now - Duration::days(20)),
        ],
    )
    .await;

    let (_, week) = get(&app, "alice", &format!("/analytics/kpis/{site}/?days=7")).await;
    assert_eq!(week["page_views"], 1);

    let (_, month) = get(&app, "alice", &format!("/analytics/kpis/{site}/?preset=last_30d")).await;
    assert_eq!(month["page_views"], 2);

    // Malformed days falls back to the 30-day default.
    let (_, fallback) = get(&app, "alice", &format!("/analytics/kpis/{site}/?days=abc")).await;
    assert_eq!(fallback["page_views"], 2);
}

#[tokio::test]
async fn foreign_and_missing_sites_are_not_allowed() {
    let (_state, app, site) = setup().await;
    for report in [
        "pages",
        "sessions",
        "new-vs-returning",
        "sources",
        "devices",
        "browsers",
        "geography",
        "kpis",
    ] {
        let (status, json) = get(&app, "bob", &format!("/analytics/{report}/{site}/")).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{report}");
        assert_eq!(json, json!({ "error": "not allowed" }));

        let (status, _) = get(&app, "alice", &format!("/analytics/{report}/missing/")).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{report}");
    }
}

#[tokio::test]
async fn path_site_id_is_normalized() {
    let (state, app, site) = setup().await;
    insert(&state, &[event(&site, "a", "/", at(10, 9, 0))]).await;
    let upper = site.to_uppercase();
    let (status, json) = get(&app, "alice", &format!("/analytics/kpis/{upper}/?{MARCH}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page_views"], 1);
}

#[tokio::test]
async fn analytics_require_authentication() {
    let (_state, app, site) = setup().await;
    let request = Request::builder()
        .uri(format!("/analytics/pages/{site}/"))
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn store_failure_is_an_internal_error_not_a_denial() {
    let db = Arc::new(DuckDbBackend::open_in_memory().expect("in-memory DuckDB"));
    let state = Arc::new(AppState {
        analytics: Arc::clone(&db) as Arc<dyn AnalyticsBackend>,
        metadata: Arc::new(DuckDbMetadataStore::new(Arc::clone(&db))),
        classifier: Arc::new(HeuristicClassifier),
        config: Arc::new(test_config()),
    });
    let site = state
        .metadata
        .create_site("alice", "example.com")
        .await
        .expect("create site");
    {
        // The lookup prepares fine but fails while reading the row.
        let conn = db.conn_for_test().await;
        conn.execute_batch(
            "ALTER TABLE sites RENAME TO sites_gone;
             CREATE VIEW sites AS
                 SELECT site_id, owner, CAST(CAST(domain AS INTEGER) AS VARCHAR) AS domain, created_at
                 FROM sites_gone;",
        )
        .expect("break sites");
    }
    let app = build_app(Arc::clone(&state));

    let (status, json) = get(&app, "alice", &format!("/analytics/pages/{}/", site.site_id)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(json, json!({ "error": "not allowed" }));
}
