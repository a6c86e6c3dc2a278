use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use sitepulse_core::site::normalize_site_id;

use crate::{auth::AuthContext, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub domain: Option<String>,
}

/// `GET /api/sites/` - the caller's sites, oldest first.
#[tracing::instrument(skip(state, auth))]
pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let sites = state.metadata.list_sites(&auth.user_id).await?;
    Ok(Json(sites))
}

/// `POST /api/create-site/` - register a site for the caller.
#[tracing::instrument(skip(state, auth, body))]
pub async fn create_site(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<CreateSiteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body.map_err(|e| AppError::validation("body", e.body_text()))?;
    let domain = body
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::validation("domain", "this field is required"))?;

    let site = state.metadata.create_site(&auth.user_id, domain).await?;
    tracing::info!(site_id = %site.site_id, owner = %auth.user_id, "site created");
    Ok((StatusCode::CREATED, Json(site)))
}

/// `DELETE /api/sites/{site_id}/` - delete an owned site and all its events.
#[tracing::instrument(skip(state, auth))]
pub async fn delete_site(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let site_id = normalize_site_id(&site_id);
    match state.metadata.get_site(&site_id).await? {
        Some(site) if site.owner == auth.user_id => {}
        _ => return Err(AppError::NotAllowed),
    }
    state.metadata.delete_site(&site_id).await?;
    tracing::info!(site_id = %site_id, "site deleted");
    Ok(StatusCode::NO_CONTENT)
}
