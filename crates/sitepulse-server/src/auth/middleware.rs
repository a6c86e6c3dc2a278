use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, state::AppState};

use super::jwt::decode_jwt;

/// Auth context injected into request extensions after successful auth.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The token's `sub` claim. Sites are scoped to this identity.
    pub user_id: String,
}

/// Require a valid `Authorization: Bearer <jwt>` header.
///
/// On success the caller's [`AuthContext`] is added to the request
/// extensions; otherwise the request is answered with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract token synchronously to avoid holding &Request across await.
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return AppError::Unauthorized.into_response();
    };

    let secret = match state.jwt_secret().await {
        Ok(secret) => secret,
        Err(e) => return AppError::Internal(e).into_response(),
    };

    match decode_jwt(&token, &secret) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthContext {
                user_id: claims.sub,
            });
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized.into_response()
        }
    }
}
