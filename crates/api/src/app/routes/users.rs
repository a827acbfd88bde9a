use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::get,
};

use firefleet_auth::Permission;
use firefleet_core::model::{PublicUser, Role, User, UserPatch};
use firefleet_core::{StationId, UserId};
use firefleet_store::Query;

use crate::app::dto::{MessageResponse, Params, Payload, UserFilter, parse_filter, parse_id};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{fetch, remove};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Managers see everyone (optionally filtered); drivers only see managers,
/// which is what they need to address requests.
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Params(filter): Params<UserFilter>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let role = if user.is_manager() {
        parse_filter::<Role>(filter.role.as_deref())?
    } else {
        Some(Role::Manager)
    };
    let station_id = parse_filter::<StationId>(filter.station_id.as_deref())?;

    let query = Query::all()
        .filter_opt(role, |u: &User, role| u.role == *role)
        .filter_opt(station_id, |u: &User, station| u.station_id == Some(*station))
        .sort_by(|a, b| a.name.cmp(&b.name));

    let users = services.db.users.find(&query).await?;
    Ok(Json(users.iter().map(User::public).collect()))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<PublicUser>> {
    require(&user, &Permission::USERS_MANAGE)?;
    let id: UserId = parse_id(&id, "user")?;
    let found = fetch(services.db.users.as_ref(), id, "user").await?;
    Ok(Json(found.public()))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(patch): Payload<UserPatch>,
) -> ApiResult<Json<PublicUser>> {
    require(&user, &Permission::USERS_MANAGE)?;
    let id: UserId = parse_id(&id, "user")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    patch.validate()?;
    if let Some(station_id) = patch.station_id {
        fetch(services.db.stations.as_ref(), station_id, "station").await?;
    }

    let change = services
        .db
        .users
        .update(id, Box::new(move |u| {
            patch.apply(u);
            Ok(())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(change.after.public()))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::USERS_MANAGE)?;
    let id: UserId = parse_id(&id, "user")?;
    if id == user.id() {
        return Err(ApiError::bad_request("you cannot delete your own account"));
    }
    remove(services.db.users.as_ref(), id, "user").await?;
    tracing::info!(user_id = %id, deleted_by = %user.id(), "user deleted");
    Ok(Json(MessageResponse::new("user deleted")))
}
