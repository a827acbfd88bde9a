use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use firefleet_auth::Permission;
use firefleet_core::model::{
    Assignment, AssignmentPatch, NewAssignment, NewNotification, NotificationKind,
};
use firefleet_core::{AssignmentId, UserId, VehicleId};
use firefleet_store::Query;

use crate::app::dto::{AssignmentFilter, MessageResponse, Params, Payload, parse_filter, parse_id};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{fetch, remove};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_assignments).post(create_assignment))
        .route(
            "/:id",
            get(get_assignment).put(update_assignment).delete(delete_assignment),
        )
}

pub async fn create_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<NewAssignment>,
) -> ApiResult<(StatusCode, Json<Assignment>)> {
    require(&user, &Permission::ASSIGNMENTS_MANAGE)?;
    body.validate()?;
    let vehicle = fetch(services.db.vehicles.as_ref(), body.vehicle_id, "vehicle").await?;
    fetch(services.db.users.as_ref(), body.driver_id, "driver").await?;

    let assignment = services
        .db
        .assignments
        .insert(body.into_assignment(user.id(), Utc::now()))
        .await?;
    tracing::info!(
        assignment_id = %assignment.id,
        vehicle_id = %assignment.vehicle_id,
        driver_id = %assignment.driver_id,
        "assignment created"
    );

    let notification = NewNotification::new(
        NotificationKind::Assignment,
        "New assignment",
        format!(
            "You are assigned to {} for {} at {} starting {}",
            vehicle.plate, assignment.mission_type, assignment.location, assignment.start_date
        ),
    )
    .related(assignment.id);
    services.notify(assignment.driver_id, &notification).await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Drivers only ever see their own assignments, whatever the filter says.
pub async fn list_assignments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Params(filter): Params<AssignmentFilter>,
) -> ApiResult<Json<Vec<Assignment>>> {
    let vehicle_id = parse_filter::<VehicleId>(filter.vehicle_id.as_deref())?;
    let driver_id = if user.is_manager() {
        parse_filter::<UserId>(filter.driver_id.as_deref())?
    } else {
        Some(user.id())
    };

    let query = Query::all()
        .filter_opt(vehicle_id, |a: &Assignment, id| a.vehicle_id == *id)
        .filter_opt(driver_id, |a: &Assignment, id| a.driver_id == *id)
        .newest_first();
    Ok(Json(services.db.assignments.find(&query).await?))
}

pub async fn get_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Assignment>> {
    let id: AssignmentId = parse_id(&id, "assignment")?;
    let assignment = fetch(services.db.assignments.as_ref(), id, "assignment").await?;
    if !user.is_manager() && assignment.driver_id != user.id() {
        return Err(ApiError::not_found("assignment"));
    }
    Ok(Json(assignment))
}

pub async fn update_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(patch): Payload<AssignmentPatch>,
) -> ApiResult<Json<Assignment>> {
    require(&user, &Permission::ASSIGNMENTS_MANAGE)?;
    let id: AssignmentId = parse_id(&id, "assignment")?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    patch.validate()?;
    if let Some(vehicle_id) = patch.vehicle_id {
        fetch(services.db.vehicles.as_ref(), vehicle_id, "vehicle").await?;
    }
    if let Some(driver_id) = patch.driver_id {
        fetch(services.db.users.as_ref(), driver_id, "driver").await?;
    }

    let change = services
        .db
        .assignments
        .update(id, Box::new(move |a| patch.apply(a)))
        .await?
        .ok_or_else(|| ApiError::not_found("assignment"))?;
    Ok(Json(change.after))
}

pub async fn delete_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&user, &Permission::ASSIGNMENTS_MANAGE)?;
    let id: AssignmentId = parse_id(&id, "assignment")?;
    remove(services.db.assignments.as_ref(), id, "assignment").await?;
    Ok(Json(MessageResponse::new("assignment deleted")))
}
