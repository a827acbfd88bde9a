//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching the store, keeping the domain
//! and store crates auth-agnostic.

use firefleet_auth::{Permission, authorize};

use crate::app::errors::ApiError;
use crate::context::CurrentUser;

/// Check that the caller holds `permission`.
pub fn require(user: &CurrentUser, permission: &Permission) -> Result<(), ApiError> {
    authorize(user.principal(), permission).map_err(|e| {
        tracing::debug!(user_id = %user.id(), role = %user.role(), permission = %permission, "denied");
        ApiError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use firefleet_core::model::{NewUser, Role};

    fn user(role: Role) -> CurrentUser {
        let user = NewUser {
            email: "test@itfaiye.gov.tr".into(),
            name: "Test".into(),
            role,
            station_id: None,
            sicil_no: None,
            phone: None,
        }
        .into_user("hash".into(), Utc::now());
        CurrentUser::new(user)
    }

    #[test]
    fn drivers_cannot_write_fleet_records() {
        let err = require(&user(Role::Driver), &Permission::FLEET_WRITE).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        assert!(require(&user(Role::Manager), &Permission::FLEET_WRITE).is_ok());
    }
}
