use axum::{
    Router,
    routing::{get, post},
};

use firefleet_core::Document;
use firefleet_store::Collection;

use crate::app::errors::{ApiError, ApiResult};

pub mod assignments;
pub mod auth;
pub mod dashboard;
pub mod fault_types;
pub mod faults;
pub mod notifications;
pub mod requests;
pub mod services;
pub mod stations;
pub mod system;
pub mod users;
pub mod vehicles;

/// Endpoints reachable without a bearer token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/users", users::router())
        .nest("/stations", stations::router())
        .nest("/vehicles", vehicles::router())
        .nest("/services", services::router())
        .nest("/fault-types", fault_types::router())
        .nest("/faults", faults::router())
        .nest("/assignments", assignments::router())
        .nest("/requests", requests::router())
        .nest("/notifications", notifications::router())
        .nest("/dashboard", dashboard::router())
}

/// Load a document or fail with 404 naming `what`.
pub(crate) async fn fetch<D: Document>(
    collection: &dyn Collection<D>,
    id: D::Id,
    what: &'static str,
) -> ApiResult<D> {
    collection
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(what))
}

/// Delete a document or fail with 404 naming `what`.
pub(crate) async fn remove<D: Document>(
    collection: &dyn Collection<D>,
    id: D::Id,
    what: &'static str,
) -> ApiResult<()> {
    if collection.delete(id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found(what))
    }
}
