use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use sitepulse_core::{
    event::{RequestContext, TrackPayload},
    site::normalize_site_id,
};

use crate::{error::AppError, state::AppState};

/// `POST /track/` (alias `POST /api/events/`) - ingest one page view.
///
/// No auth. The event is written before the response is sent; an unknown or
/// missing `site_id` is a validation error and nothing is stored.
///
/// `user_agent` and `ip_address` fall back to the `User-Agent` header and the
/// first `X-Forwarded-For` entry when the payload omits them.
///
/// ## Response
/// `201 Created` with `{ "status": "ok" }`.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<TrackPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::validation("body", e.body_text()))?;

    let site_id = payload
        .site_id
        .as_deref()
        .map(normalize_site_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("site_id", "this field is required"))?;

    if !state.metadata.site_exists(&site_id).await? {
        return Err(AppError::validation("site_id", "unknown site"));
    }

    let ctx = RequestContext {
        received_at: Utc::now(),
        user_agent: headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        client_ip: extract_client_ip(&headers),
    };

    let event = payload.into_event(site_id, ctx)?;
    if !state.analytics.insert_event(&event).await? {
        // Deleted between the lookup and the insert.
        return Err(AppError::validation("site_id", "unknown site"));
    }
    tracing::debug!(site_id = %event.site_id, url = %event.url, "event tracked");

    Ok((StatusCode::CREATED, Json(json!({ "status": "ok" }))))
}

/// First entry of `X-Forwarded-For`, if present and non-empty.
fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
