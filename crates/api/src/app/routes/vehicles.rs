use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::Utc;

use firefleet_auth::Permission;
use firefleet_core::model::{
    AccidentRecord, Equipment, MaintenanceRecord, NewAccident, NewEquipment, NewMaintenance,
    NewVehicle, Vehicle, VehiclePatch, VehicleStatus, newest_first,
};
use firefleet_core::{EquipmentId, StationId, VehicleId};
use firefleet_store::{Mutator, Query, StoreError};

use crate::app::dto::{MessageResponse, Params, Payload, VehicleFilter, parse_filter, parse_id};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{fetch, remove};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/:id", get(get_vehicle).put(update_vehicle).delete(delete_vehicle))
        .route("/:id/equipment", get(list_equipment).post(add_equipment))
        .route("/:id/equipment/:equipment_id", delete(remove_equipment))
        .route("/:id/accidents", get(list_accidents))
        .route("/:id/accident", post(record_accident))
        .route("/:id/maintenance", get(list_maintenance).post(record_maintenance))
}

pub async fn create_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<NewVehicle>,
) -> ApiResult<(StatusCode, Json<Vehicle>)> {
    require(&user, &Permission::FLEET_WRITE)?;
    let now = Utc::now();
    body.validate(now)?;
    fetch(services.db.stations.as_ref(), body.station_id, "station").await?;
    if let Some(driver_id) = body.assigned_driver_id {
        fetch(services.db.users.as_ref(), driver_id, "driver").await?;
    }

    let plate = body.plate.trim().to_string();
    let vehicle = services
        .db
        .vehicles
        .insert_unique(body.into_vehicle(now), plate_identity)
        .await
        .map_err(|err| plate_taken(err, &plate))?;
    tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "vehicle created");
    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn list_vehicles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Params(filter): Params<VehicleFilter>,
) -> ApiResult<Json<Vec<Vehicle>>> {
    require(&user, &Permission::FLEET_READ)?;
    let requested = parse_filter::<StationId>(filter.station_id.as_deref())?;
    let station_id = match (user.is_manager(), user.station_id()) {
        (false, Some(own)) => Some(own),
        _ => requested,
    };
    let status = parse_filter::<VehicleStatus>(filter.status.as_deref())?;
    let vehicle_type = filter
        .vehicle_type
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let query = Query::all()
        .filter_opt(station_id, |v: &Vehicle, station| v.station_id == *station)
        .filter_opt(status, |v: &Vehicle, status| v.status == *status)
        .filter_opt(vehicle_type, |v: &Vehicle, wanted| {
            v.vehicle_type
                .as_deref()
                .is_some_and(|t| t.to_lowercase() == *wanted)
        })
        .sort_by(|a, b| a.plate.cmp(&b.plate));

    Ok(Json(services.db.vehicles.find(&query).await?))
}

pub async fn get_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vehicle>> {
    require(&user, &Permission::FLEET_READ)?;
    Ok(Json(load(&services, &id).await?))
}

pub async fn update_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(patch): Payload<VehiclePatch>,
) -> ApiResult<Json<Vehicle>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: VehicleId = parse_id(&id, "vehicle")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    patch.validate(Utc::now())?;
    if let Some(station_id) = patch.station_id {
        fetch(services.db.stations.as_ref(), station_id, "station").await?;
    }
    if let Some(driver_id) = patch.assigned_driver_id {
        fetch(services.db.users.as_ref(), driver_id, "driver").await?;
    }
    let plate = patch.plate.as_deref().map(str::trim).map(str::to_string);
    let edit: Mutator<Vehicle> = Box::new(move |v| {
        patch.apply(v);
        Ok(())
    });

    let vehicles = &services.db.vehicles;
    let change = match &plate {
        Some(plate) => vehicles
            .update_unique(id, edit, plate_identity)
            .await
            .map_err(|err| plate_taken(err, plate))?,
        None => vehicles.update(id, edit).await?,
    };
    let change = change.ok_or_else(|| ApiError::not_found("vehicle"))?;
    Ok(Json(change.after))
}

pub async fn delete_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: VehicleId = parse_id(&id, "vehicle")?;
    remove(services.db.vehicles.as_ref(), id, "vehicle").await?;
    tracing::info!(vehicle_id = %id, "vehicle deleted");
    Ok(Json(MessageResponse::new("vehicle deleted")))
}

// -------------------------
// Equipment
// -------------------------

pub async fn list_equipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Equipment>>> {
    require(&user, &Permission::FLEET_READ)?;
    Ok(Json(load(&services, &id).await?.equipment))
}

pub async fn add_equipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(body): Payload<NewEquipment>,
) -> ApiResult<(StatusCode, Json<Equipment>)> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: VehicleId = parse_id(&id, "vehicle")?;
    body.validate()?;

    let change = services
        .db
        .vehicles
        .update(id, Box::new(move |v| v.add_equipment(body).map(|_| ())))
        .await?
        .ok_or_else(|| ApiError::not_found("vehicle"))?;
    let added = change
        .after
        .equipment
        .last()
        .cloned()
        .ok_or_else(|| ApiError::internal("equipment was not stored"))?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn remove_equipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((id, equipment_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: VehicleId = parse_id(&id, "vehicle")?;
    let equipment_id: EquipmentId = parse_id(&equipment_id, "equipment")?;

    services
        .db
        .vehicles
        .update(id, Box::new(move |v| v.remove_equipment(equipment_id).map(|_| ())))
        .await?
        .ok_or_else(|| ApiError::not_found("vehicle"))?;
    Ok(Json(MessageResponse::new("equipment removed")))
}

// -------------------------
// Accidents & maintenance
// -------------------------

pub async fn list_accidents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AccidentRecord>>> {
    require(&user, &Permission::FLEET_READ)?;
    let mut accidents = load(&services, &id).await?.accidents;
    newest_first(&mut accidents, |a| (a.date.as_str(), a.created_at));
    Ok(Json(accidents))
}

pub async fn record_accident(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(body): Payload<NewAccident>,
) -> ApiResult<(StatusCode, Json<AccidentRecord>)> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: VehicleId = parse_id(&id, "vehicle")?;
    if let Some(driver_id) = body.driver_id {
        fetch(services.db.users.as_ref(), driver_id, "driver").await?;
    }

    let recorded_by = user.id();
    let change = services
        .db
        .vehicles
        .update(id, Box::new(move |v| {
            v.record_accident(body, recorded_by, Utc::now()).map(|_| ())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("vehicle"))?;
    let record = change
        .after
        .accidents
        .last()
        .cloned()
        .ok_or_else(|| ApiError::internal("accident was not stored"))?;
    tracing::info!(vehicle_id = %id, record_id = %record.id, "accident recorded");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_maintenance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<MaintenanceRecord>>> {
    require(&user, &Permission::FLEET_READ)?;
    let mut records = load(&services, &id).await?.maintenance;
    newest_first(&mut records, |m| (m.date.as_str(), m.created_at));
    Ok(Json(records))
}

pub async fn record_maintenance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(body): Payload<NewMaintenance>,
) -> ApiResult<(StatusCode, Json<MaintenanceRecord>)> {
    require(&user, &Permission::FLEET_WRITE)?;
    let id: VehicleId = parse_id(&id, "vehicle")?;

    let recorded_by = user.id();
    let change = services
        .db
        .vehicles
        .update(id, Box::new(move |v| {
            v.record_maintenance(body, recorded_by, Utc::now()).map(|_| ())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("vehicle"))?;
    let record = change
        .after
        .maintenance
        .last()
        .cloned()
        .ok_or_else(|| ApiError::internal("maintenance record was not stored"))?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn load(services: &AppServices, raw_id: &str) -> ApiResult<Vehicle> {
    let id: VehicleId = parse_id(raw_id, "vehicle")?;
    fetch(services.db.vehicles.as_ref(), id, "vehicle").await
}

/// Plates compare ignoring case and whitespace.
fn plate_identity(vehicle: &Vehicle) -> String {
    Vehicle::plate_key(&vehicle.plate)
}

fn plate_taken(err: StoreError, plate: &str) -> ApiError {
    match err {
        StoreError::Conflict(_) => {
            ApiError::Conflict(format!("a vehicle with plate '{plate}' already exists"))
        }
        other => other.into(),
    }
}
