use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use firefleet_auth::Permission;
use firefleet_core::StationId;
use firefleet_core::model::{NewStation, Station, StationPatch};
use firefleet_store::Query;

use crate::app::dto::{MessageResponse, Payload, parse_id};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{fetch, remove};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stations).post(create_station))
        .route("/:id", get(get_station).put(update_station).delete(delete_station))
}

pub async fn create_station(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<NewStation>,
) -> ApiResult<(StatusCode, Json<Station>)> {
    require(&user, &Permission::FLEET_WRITE)?;
    body.validate()?;
    if let Some(manager_id) = body.manager_id {
        fetch(services.db.users.as_ref(), manager_id, "manager").await?;
    }
    let station = services.db.stations.insert(body.into_station(Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(station)))
}

pub async fn list_stations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Station>>> {
    require(&user, &Permission::FLEET_READ)?;
    let query = Query::all().sort_by(|a: &Station, b: &Station| a.name.cmp(&b.name));
    Ok(Json(services.db.stations.find(&query).await?))
}

pub async fn get_station(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Station>> {
    require(&user, &Permission::FLEET_READ)?;
    let id: StationId = parse_id(&id, "station")?;
    Ok(Json(fetch(services.db.stations.as_ref(), id, "station").await?))
}

pub async fn update_station(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(patch): Payload<StationPatch>,
) -> ApiResult<Json<Station>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: StationId = parse_id(&id, "station")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    patch.validate()?;

    let change = services
        .db
        .stations
        .update(id, Box::new(move |s| {
            patch.apply(s);
            Ok(())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("station"))?;
    Ok(Json(change.after))
}

pub async fn delete_station(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: StationId = parse_id(&id, "station")?;
    remove(services.db.stations.as_ref(), id, "station").await?;
    Ok(Json(MessageResponse::new("station deleted")))
}
