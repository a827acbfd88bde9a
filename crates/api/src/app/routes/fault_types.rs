use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use firefleet_auth::Permission;
use firefleet_core::FaultTypeId;
use firefleet_core::model::{FaultType, FaultTypePatch, NewFaultType};
use firefleet_store::Query;

use crate::app::dto::{MessageResponse, Payload, parse_id};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{fetch, remove};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_fault_types).post(create_fault_type))
        .route(
            "/:id",
            get(get_fault_type).put(update_fault_type).delete(delete_fault_type),
        )
}

pub async fn create_fault_type(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<NewFaultType>,
) -> ApiResult<(StatusCode, Json<FaultType>)> {
    require(&user, &Permission::FLEET_WRITE)?;
    body.validate()?;
    let fault_type = services
        .db
        .fault_types
        .insert(body.into_fault_type(Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(fault_type)))
}

pub async fn list_fault_types(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<FaultType>>> {
    require(&user, &Permission::FLEET_READ)?;
    let query = Query::all().sort_by(|a: &FaultType, b: &FaultType| a.name.cmp(&b.name));
    Ok(Json(services.db.fault_types.find(&query).await?))
}

pub async fn get_fault_type(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<FaultType>> {
    require(&user, &Permission::FLEET_READ)?;
    let id: FaultTypeId = parse_id(&id, "fault type")?;
    Ok(Json(fetch(services.db.fault_types.as_ref(), id, "fault type").await?))
}

pub async fn update_fault_type(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(patch): Payload<FaultTypePatch>,
) -> ApiResult<Json<FaultType>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: FaultTypeId = parse_id(&id, "fault type")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    patch.validate()?;

    let change = services
        .db
        .fault_types
        .update(id, Box::new(move |t| {
            patch.apply(t);
            Ok(())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("fault type"))?;
    Ok(Json(change.after))
}

/// Faults keep their dangling `fault_type_id`; statistics report them as
/// unspecified.
pub async fn delete_fault_type(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: FaultTypeId = parse_id(&id, "fault type")?;
    remove(services.db.fault_types.as_ref(), id, "fault type").await?;
    Ok(Json(MessageResponse::new("fault type deleted")))
}
