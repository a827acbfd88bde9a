use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use firefleet_core::dates::parse_instant;
use firefleet_core::id::blank_as_none;
use firefleet_core::model::{PublicUser, Role};
use firefleet_core::{DomainError, DomainResult, StationId};

use crate::app::errors::{ApiError, ApiResult};

// -------------------------
// Extractors
// -------------------------

/// JSON body whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// Query string whose rejections use the API error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Params<T>(pub T);

/// Parse a path id; malformed ids read as "not found".
pub fn parse_id<T>(raw: &str, what: &'static str) -> ApiResult<T>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(|_| ApiError::not_found(what))
}

/// Parse an optional query-string filter value (blank = absent).
pub fn parse_filter<T>(raw: Option<&str>) -> ApiResult<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map(Some).map_err(ApiError::from),
        None => Ok(None),
    }
}

/// Parse an optional date query parameter with `parse` (e.g.
/// [`parse_instant`] for a lower bound,
/// [`firefleet_core::dates::parse_range_end`] for an upper one).
pub fn parse_date_filter(
    field: &str,
    raw: Option<&str>,
    parse: fn(&str) -> DomainResult<DateTime<Utc>>,
) -> ApiResult<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse(s)
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{field} must be an ISO-8601 date"))),
        None => Ok(None),
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub station_id: Option<StationId>,
    pub sicil_no: Option<String>,
    pub phone: Option<String>,
    /// Registration code required for `role = manager`.
    pub manager_password: Option<String>,
}

fn default_role() -> Role {
    Role::Driver
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<String>,
    pub station_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilter {
    pub station_id: Option<String>,
    pub status: Option<String>,
    pub vehicle_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FaultFilter {
    pub vehicle_id: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsParams {
    pub limit: Option<usize>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentFilter {
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefleet_core::VehicleId;
    use firefleet_core::model::FaultStatus;

    #[test]
    fn malformed_path_id_is_not_found() {
        let err = parse_id::<VehicleId>("nope", "vehicle").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn filters_treat_blank_as_absent() {
        assert_eq!(parse_filter::<FaultStatus>(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_filter::<FaultStatus>(Some("resolved")).unwrap(),
            Some(FaultStatus::Resolved)
        );
        assert!(parse_filter::<FaultStatus>(Some("closed")).is_err());
        assert!(parse_date_filter("start_date", Some("yesterday"), parse_instant).is_err());
    }

    #[test]
    fn register_defaults_to_driver() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"secret1","name":"A"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::Driver);
    }
}
