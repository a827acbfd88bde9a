use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use firefleet_auth::Permission;
use firefleet_core::ServiceId;
use firefleet_core::model::{NewService, Service, ServicePatch};
use firefleet_store::Query;

use crate::app::dto::{MessageResponse, Payload, parse_id};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{fetch, remove};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/:id", get(get_service).put(update_service).delete(delete_service))
}

pub async fn create_service(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<NewService>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    require(&user, &Permission::FLEET_WRITE)?;
    body.validate()?;
    let service = services.db.services.insert(body.into_service(Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn list_services(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Service>>> {
    require(&user, &Permission::FLEET_READ)?;
    let query = Query::all().sort_by(|a: &Service, b: &Service| a.name.cmp(&b.name));
    Ok(Json(services.db.services.find(&query).await?))
}

pub async fn get_service(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Service>> {
    require(&user, &Permission::FLEET_READ)?;
    let id: ServiceId = parse_id(&id, "service")?;
    Ok(Json(fetch(services.db.services.as_ref(), id, "service").await?))
}

pub async fn update_service(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(patch): Payload<ServicePatch>,
) -> ApiResult<Json<Service>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: ServiceId = parse_id(&id, "service")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    patch.validate()?;

    let change = services
        .db
        .services
        .update(id, Box::new(move |s| {
            patch.apply(s);
            Ok(())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("service"))?;
    Ok(Json(change.after))
}

pub async fn delete_service(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: ServiceId = parse_id(&id, "service")?;
    remove(services.db.services.as_ref(), id, "service").await?;
    Ok(Json(MessageResponse::new("service deleted")))
}
