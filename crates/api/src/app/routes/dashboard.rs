use std::sync::Arc;

use axum::{Json, Router, extract::Extension, routing::get};
use chrono::Utc;
use serde::Serialize;

use firefleet_auth::Permission;
use firefleet_core::dates::parse_optional;
use firefleet_core::model::{ExpiringDocument, Role, User, Vehicle};
use firefleet_core::stats::dashboard_stats;
use firefleet_core::{DashboardStats, StationId, VehicleId};
use firefleet_store::Query;

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/expiring", get(expiring))
}

#[derive(Debug, Serialize)]
pub struct ExpiringVehicle {
    pub vehicle_id: VehicleId,
    pub plate: String,
    pub station_id: StationId,
    pub documents: Vec<ExpiringDocument>,
}

pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<DashboardStats>> {
    require(&user, &Permission::DASHBOARD_READ)?;
    let vehicles = services.db.vehicles.find(&visible_vehicles(&user)).await?;
    let faults = services.db.faults.find(&Query::all()).await?;
    let total_stations = services.db.stations.count(&Query::all()).await?;
    let total_drivers = services
        .db
        .users
        .count(&Query::all().filter(|u: &User| u.role == Role::Driver))
        .await?;

    Ok(Json(dashboard_stats(
        &vehicles,
        &faults,
        total_stations,
        total_drivers,
        Utc::now(),
    )))
}

/// Vehicles with an insurance, inspection or kasko date inside the expiry
/// window (or already past), soonest first.
pub async fn expiring(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<ExpiringVehicle>>> {
    require(&user, &Permission::DASHBOARD_READ)?;
    let now = Utc::now();
    let vehicles = services.db.vehicles.find(&visible_vehicles(&user)).await?;

    let mut rows: Vec<ExpiringVehicle> = vehicles
        .into_iter()
        .filter_map(|v| {
            let mut documents = v.expiring_documents(now);
            if documents.is_empty() {
                return None;
            }
            documents.sort_by_key(|d| parse_optional(Some(d.expires_at.as_str())));
            Some(ExpiringVehicle {
                vehicle_id: v.id,
                plate: v.plate,
                station_id: v.station_id,
                documents,
            })
        })
        .collect();
    rows.sort_by_key(|row| {
        row.documents
            .first()
            .and_then(|d| parse_optional(Some(d.expires_at.as_str())))
    });
    Ok(Json(rows))
}

/// Drivers attached to a station only count that station's vehicles.
fn visible_vehicles(user: &CurrentUser) -> Query<Vehicle> {
    let station = (!user.is_manager()).then(|| user.station_id()).flatten();
    Query::all().filter_opt(station, |v: &Vehicle, station: &StationId| v.station_id == *station)
}
