use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode};
use chrono::Utc;

use firefleet_auth::{hash_password, validate_password, verify_password};
use firefleet_core::model::{NewUser, PublicUser, Role, User, user::normalize_email};
use firefleet_store::{Query, StoreError};

use crate::app::dto::{AuthResponse, LoginRequest, Payload, RegisterRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::fetch;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Payload(body): Payload<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if body.role == Role::Manager {
        let code = services
            .manager_registration_code()
            .ok_or_else(|| ApiError::forbidden("manager self-registration is disabled"))?;
        if body.manager_password.as_deref() != Some(code) {
            return Err(ApiError::forbidden("invalid manager registration code"));
        }
    }

    let profile = NewUser {
        email: body.email,
        name: body.name,
        role: body.role,
        station_id: body.station_id,
        sicil_no: body.sicil_no,
        phone: body.phone,
    };
    profile.validate()?;
    validate_password(&body.password)?;

    if let Some(station_id) = profile.station_id {
        fetch(services.db.stations.as_ref(), station_id, "station").await?;
    }

    let user = profile.into_user(hash_password(&body.password)?, Utc::now());
    let user = services
        .db
        .users
        .insert_unique(user, |u: &User| normalize_email(&u.email))
        .await
        .map_err(|err| match err {
            StoreError::Conflict(_) => ApiError::bad_request("email is already registered"),
            other => other.into(),
        })?;
    tracing::info!(user_id = %user.id, role = %user.role, "user registered");

    let token = services.jwt.issue(user.id, user.role, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.public(),
        }),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Payload(body): Payload<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::unauthorized("invalid email or password");

    let user = find_by_email(&services, &body.email).await?.ok_or_else(invalid)?;
    if !verify_password(&body.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = services.jwt.issue(user.id, user.role, Utc::now())?;
    Ok(Json(AuthResponse {
        token,
        user: user.public(),
    }))
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<PublicUser> {
    Json(user.user().public())
}

async fn find_by_email(services: &AppServices, email: &str) -> ApiResult<Option<User>> {
    let email = normalize_email(email);
    let matches = services
        .db
        .users
        .find(&Query::all().filter(move |u: &User| u.email == email).limit(1))
        .await?;
    Ok(matches.into_iter().next())
}
