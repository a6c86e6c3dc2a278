use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth::require_auth, routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Public routes: `/health` and the ingest endpoints, which tracked pages
/// call cross-origin. Everything else sits behind [`require_auth`].
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` - structured request/response logging via `tracing`.
/// 2. `CorsLayer` - the configured dashboard origins, or any origin when none
///    are configured.
pub fn build_app(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health::health))
        .route("/track/", post(routes::track::track))
        .route("/api/events/", post(routes::track::track));

    let protected = Router::new()
        .route("/api/sites/", get(routes::sites::list_sites))
        .route("/api/create-site/", post(routes::sites::create_site))
        .route("/api/sites/{site_id}/", delete(routes::sites::delete_site))
        .route("/analytics/pages/{site_id}/", get(routes::analytics::pages))
        .route(
            "/analytics/sessions/{site_id}/",
            get(routes::analytics::sessions),
        )
        .route(
            "/analytics/new-vs-returning/{site_id}/",
            get(routes::analytics::new_vs_returning),
        )
        .route(
            "/analytics/sources/{site_id}/",
            get(routes::analytics::sources),
        )
        .route(
            "/analytics/devices/{site_id}/",
            get(routes::analytics::devices),
        )
        .route(
            "/analytics/browsers/{site_id}/",
            get(routes::analytics::browsers),
        )
        .route(
            "/analytics/geography/{site_id}/",
            get(routes::analytics::geography),
        )
        .route("/analytics/kpis/{site_id}/", get(routes::analytics::kpis))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_auth,
        ));

    let cors = cors_layer(&state.config.cors_origins);

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
