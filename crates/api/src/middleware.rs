use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use firefleet_auth::JwtValidator;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub services: Arc<AppServices>,
}

/// Resolve the bearer token to a stored user and attach it as [`CurrentUser`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .jwt
        .validate(token, Utc::now())
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::unauthorized("invalid token")
        })?;

    let user = state
        .services
        .db
        .users
        .get(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("user no longer exists"))?;

    req.extensions_mut().insert(CurrentUser::new(user));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::unauthorized("missing bearer token");

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(missing)?;

    let header = header.to_str().map_err(|_| missing())?;

    let header = header.strip_prefix("Bearer ").ok_or_else(missing)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(missing());
    }

    Ok(token)
}
