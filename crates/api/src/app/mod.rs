//! HTTP application wiring (Axum router + shared services).
//!
//! - `services.rs`: store handles, token issuer, notification fan-out
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: extractors and request/response shapes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use firefleet_auth::JwtValidator;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router, everything mounted under `/api`.
///
/// `cors_origins = None` allows any origin.
pub fn build_app(services: Arc<AppServices>, cors_origins: Option<Vec<String>>) -> Router {
    let jwt: Arc<dyn JwtValidator> = services.jwt.clone();
    let auth_state = middleware::AuthState {
        jwt,
        services: services.clone(),
    };

    // Protected routes: require a bearer token resolving to a stored user.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = routes::public_router()
        .merge(protected)
        .layer(Extension(services));

    Router::new().nest("/api", api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(cors_origins)),
    )
}

fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origins {
        None => layer.allow_origin(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer
                .allow_origin(AllowOrigin::list(origins))
                .allow_credentials(true)
        }
    }
}
