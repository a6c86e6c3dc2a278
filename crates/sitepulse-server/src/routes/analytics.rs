//! Dashboard endpoints under `/analytics/{report}/{site_id}/`.
//!
//! Every handler resolves the requested window, checks that the caller owns
//! the site, loads the window's events, narrows them with the segment filter
//! and hands them to a pure aggregator.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use sitepulse_core::{
    aggregate,
    event::Event,
    segment::Segment,
    site::normalize_site_id,
    window::{resolve, RangeRequest, Window},
};

use crate::{auth::AuthContext, error::AppError, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub preset: Option<String>,
    pub services: Option<String>,
    pub posts: Option<String>,
    pub compare: Option<String>,
}

impl AnalyticsQuery {
    fn window(&self) -> Window {
        let request = RangeRequest {
            start: self.start.as_deref(),
            end: self.end.as_deref(),
            preset: self.preset.as_deref(),
            days: self.days.as_deref(),
        };
        resolve(&request, Utc::now())
    }

    fn segment(&self) -> Segment {
        Segment::parse(self.services.as_deref(), self.posts.as_deref())
    }

    fn wants_comparison(&self) -> bool {
        self.compare.as_deref().is_some_and(is_truthy)
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Resolve the path id and make sure `auth` owns it.
///
/// Missing and foreign sites both yield [`AppError::NotAllowed`].
async fn authorize(state: &AppState, auth: &AuthContext, raw_id: &str) -> Result<String, AppError> {
    let site_id = normalize_site_id(raw_id);
    match state.metadata.get_site(&site_id).await? {
        Some(site) if site.owner == auth.user_id => Ok(site_id),
        _ => Err(AppError::NotAllowed),
    }
}

/// Events of `site_id` in `window` that pass `segment`.
async fn scoped_events(
    state: &AppState,
    site_id: &str,
    window: &Window,
    segment: &Segment,
) -> Result<Vec<Event>, AppError> {
    let events = state.analytics.events_in_window(site_id, window).await?;
    Ok(segment.apply(events))
}

/// `GET /analytics/pages/{site_id}/` - daily page views and top pages.
#[tracing::instrument(skip(state, auth))]
pub async fn pages(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let events = scoped_events(&state, &site_id, &window, &query.segment()).await?;
    Ok(Json(aggregate::page_views(&events)))
}

/// `GET /analytics/sessions/{site_id}/` - session count, average duration,
/// daily trend and the session list.
#[tracing::instrument(skip(state, auth))]
pub async fn sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let events = scoped_events(&state, &site_id, &window, &query.segment()).await?;
    Ok(Json(aggregate::session_metrics(&events)))
}

/// `GET /analytics/new-vs-returning/{site_id}/`
#[tracing::instrument(skip(state, auth))]
pub async fn new_vs_returning(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let events = scoped_events(&state, &site_id, &window, &query.segment()).await?;
    // First-seen spans the whole history and ignores the segment.
    let first_seen = state.analytics.session_first_seen(&site_id, &window).await?;
    Ok(Json(aggregate::new_vs_returning(
        &events,
        &first_seen,
        &window,
    )))
}

#[tracing::instrument(skip(state, auth))]
pub async fn sources(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let events = scoped_events(&state, &site_id, &window, &query.segment()).await?;
    Ok(Json(aggregate::sources(&events)))
}

#[tracing::instrument(skip(state, auth))]
pub async fn devices(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let events = scoped_events(&state, &site_id, &window, &query.segment()).await?;
    Ok(Json(aggregate::devices(&events, state.classifier.as_ref())))
}

#[tracing::instrument(skip(state, auth))]
pub async fn browsers(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let events = scoped_events(&state, &site_id, &window, &query.segment()).await?;
    Ok(Json(aggregate::browsers(&events, state.classifier.as_ref())))
}

#[tracing::instrument(skip(state, auth))]
pub async fn geography(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let events = scoped_events(&state, &site_id, &window, &query.segment()).await?;
    Ok(Json(aggregate::geography(&events)))
}

/// `GET /analytics/kpis/{site_id}/` - headline numbers.
///
/// With a truthy `compare`, the same figures for the immediately preceding
/// window of equal length are attached together with percent changes.
#[tracing::instrument(skip(state, auth))]
pub async fn kpis(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window();
    let segment = query.segment();
    let site_id = authorize(&state, &auth, &site_id).await?;
    let current = aggregate::kpis(&scoped_events(&state, &site_id, &window, &segment).await?);

    let previous = if query.wants_comparison() {
        let events = scoped_events(&state, &site_id, &window.comparison(), &segment).await?;
        Some(aggregate::kpis(&events))
    } else {
        None
    };

    Ok(Json(aggregate::KpiReport::new(current, previous)))
}
