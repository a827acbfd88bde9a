use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};

use firefleet_auth::Permission;
use firefleet_core::model::{
    Fault, FaultPatch, FaultStatus, NewFault, NewNotification, NotificationKind, VehicleStatus,
};
use firefleet_core::dates::{parse_instant, parse_range_end};
use firefleet_core::stats::{top_fault_types, top_vehicle_groups};
use firefleet_core::{FaultId, FaultTypeCount, VehicleGroupCount, VehicleId};
use firefleet_store::Query;

use crate::app::dto::{
    FaultFilter, MessageResponse, Params, Payload, StatisticsParams, parse_date_filter,
    parse_filter, parse_id,
};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{fetch, remove};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

const DEFAULT_STATISTICS_LIMIT: usize = 10;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_faults).post(report_fault))
        .route("/statistics/top-faults", get(top_faults))
        .route("/statistics/top-groups", get(top_groups))
        .route("/:id", get(get_fault).put(update_fault).delete(delete_fault))
}

/// Report a fault. An active vehicle is flagged `faulty` and every manager
/// is notified. A vehicle in `accident` status keeps it.
pub async fn report_fault(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<NewFault>,
) -> ApiResult<(StatusCode, Json<Fault>)> {
    require(&user, &Permission::FAULTS_REPORT)?;
    body.validate()?;
    let vehicle = fetch(services.db.vehicles.as_ref(), body.vehicle_id, "vehicle").await?;
    if let Some(fault_type_id) = body.fault_type_id {
        fetch(services.db.fault_types.as_ref(), fault_type_id, "fault type").await?;
    }
    if let Some(service_id) = body.service_id {
        fetch(services.db.services.as_ref(), service_id, "service").await?;
    }

    let fault = services
        .db
        .faults
        .insert(body.into_fault(user.id(), Utc::now()))
        .await?;
    tracing::info!(fault_id = %fault.id, vehicle_id = %vehicle.id, priority = %fault.priority, "fault reported");

    // The fault is stored; follow-up failures are logged, not returned.
    if let Err(err) = sync_vehicle_status(&services, vehicle.id).await {
        tracing::warn!(fault_id = %fault.id, error = %err, "failed to flag vehicle as faulty");
    }
    let notification = NewNotification::new(
        NotificationKind::Fault,
        "New fault reported",
        format!(
            "{} reported a fault on {}: {}",
            user.user().name,
            vehicle.plate,
            fault.description
        ),
    )
    .related(fault.id);
    if let Err(err) = services.notify_managers(&notification).await {
        tracing::warn!(fault_id = %fault.id, error = %err, "failed to notify managers");
    }

    Ok((StatusCode::CREATED, Json(fault)))
}

pub async fn list_faults(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Params(filter): Params<FaultFilter>,
) -> ApiResult<Json<Vec<Fault>>> {
    require(&user, &Permission::FLEET_READ)?;
    let vehicle_id = parse_filter::<VehicleId>(filter.vehicle_id.as_deref())?;
    let status = parse_filter::<FaultStatus>(filter.status.as_deref())?;
    let range = created_range(filter.start_date.as_deref(), filter.end_date.as_deref())?;

    let query = range
        .filter_opt(vehicle_id, |f: &Fault, id| f.vehicle_id == *id)
        .filter_opt(status, |f: &Fault, status| f.status == *status)
        .newest_first();
    Ok(Json(services.db.faults.find(&query).await?))
}

pub async fn get_fault(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Fault>> {
    require(&user, &Permission::FLEET_READ)?;
    let id: FaultId = parse_id(&id, "fault")?;
    Ok(Json(fetch(services.db.faults.as_ref(), id, "fault").await?))
}

/// Progress a fault. Resolving it notifies the reporter and reactivates the
/// vehicle once no other fault on it is open; reopening flags it again.
pub async fn update_fault(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(patch): Payload<FaultPatch>,
) -> ApiResult<Json<Fault>> {
    require(&user, &Permission::FAULTS_MANAGE)?;
    let id: FaultId = parse_id(&id, "fault")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    if let Some(service_id) = patch.service_id {
        fetch(services.db.services.as_ref(), service_id, "service").await?;
    }
    if let Some(fault_type_id) = patch.fault_type_id {
        fetch(services.db.fault_types.as_ref(), fault_type_id, "fault type").await?;
    }

    let change = services
        .db
        .faults
        .update(id, Box::new(move |f| {
            patch.apply(f, Utc::now());
            Ok(())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("fault"))?;
    let (before, fault) = (change.before, change.after);

    if before.is_open() != fault.is_open() {
        sync_vehicle_status(&services, fault.vehicle_id).await?;
    }

    if before.is_open() && !fault.is_open() {
        tracing::info!(fault_id = %fault.id, resolved_by = %user.id(), "fault resolved");
        let notification = NewNotification::new(
            NotificationKind::Fault,
            "Fault resolved",
            format!("Your fault report \"{}\" has been resolved", fault.description),
        )
        .related(fault.id);
        services.notify(fault.reported_by, &notification).await?;
    }

    Ok(Json(fault))
}

pub async fn delete_fault(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::FAULTS_MANAGE)?;
    let id: FaultId = parse_id(&id, "fault")?;
    let fault = fetch(services.db.faults.as_ref(), id, "fault").await?;
    remove(services.db.faults.as_ref(), id, "fault").await?;
    if fault.is_open() {
        sync_vehicle_status(&services, fault.vehicle_id).await?;
    }
    Ok(Json(MessageResponse::new("fault deleted")))
}

pub async fn top_faults(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Params(params): Params<StatisticsParams>,
) -> ApiResult<Json<Vec<FaultTypeCount>>> {
    require(&user, &Permission::DASHBOARD_READ)?;
    let range = created_range(params.start_date.as_deref(), params.end_date.as_deref())?;
    let faults = services.db.faults.find(&range).await?;
    let fault_types = services.db.fault_types.find(&Query::all()).await?;
    let limit = params.limit.unwrap_or(DEFAULT_STATISTICS_LIMIT);
    Ok(Json(top_fault_types(&faults, &fault_types, limit)))
}

pub async fn top_groups(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Params(params): Params<StatisticsParams>,
) -> ApiResult<Json<Vec<VehicleGroupCount>>> {
    require(&user, &Permission::DASHBOARD_READ)?;
    let range = created_range(params.start_date.as_deref(), params.end_date.as_deref())?;
    let faults = services.db.faults.find(&range).await?;
    let vehicles = services.db.vehicles.find(&Query::all()).await?;
    let limit = params.limit.unwrap_or(DEFAULT_STATISTICS_LIMIT);
    Ok(Json(top_vehicle_groups(&faults, &vehicles, limit)))
}

/// Query over faults created inside the optional `[start, end]` range. A
/// calendar-date end includes that whole day.
fn created_range(start: Option<&str>, end: Option<&str>) -> ApiResult<Query<Fault>> {
    let start = parse_date_filter("start_date", start, parse_instant)?;
    let end = parse_date_filter("end_date", end, parse_range_end)?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ApiError::bad_request("end_date must not be before start_date"));
        }
    }
    Ok(Query::all()
        .filter_opt(start, |f: &Fault, start: &DateTime<Utc>| f.created_at >= *start)
        .filter_opt(end, |f: &Fault, end: &DateTime<Utc>| f.created_at <= *end))
}

/// Keep a vehicle's status in line with its open faults: `faulty` while any
/// is open, back to `active` once none are. Accident status is left alone.
async fn sync_vehicle_status(services: &AppServices, vehicle_id: VehicleId) -> ApiResult<()> {
    let open = services
        .db
        .faults
        .count(&Query::all().filter(move |f: &Fault| f.vehicle_id == vehicle_id && f.is_open()))
        .await?;

    let updated = services
        .db
        .vehicles
        .update(vehicle_id, Box::new(move |v| {
            match (v.status, open) {
                (VehicleStatus::Faulty, 0) => v.status = VehicleStatus::Active,
                (VehicleStatus::Active, n) if n > 0 => v.status = VehicleStatus::Faulty,
                _ => {}
            }
            Ok(())
        }))
        .await?;

    match updated {
        Some(change) if change.before.status != change.after.status => {
            tracing::info!(
                vehicle_id = %vehicle_id,
                status = %change.after.status,
                "vehicle status updated from faults"
            );
        }
        Some(_) => {}
        // The vehicle may have been deleted while its faults were kept.
        None => tracing::debug!(vehicle_id = %vehicle_id, "fault refers to a missing vehicle"),
    }
    Ok(())
}
