use firefleet_auth::Principal;
use firefleet_core::model::{Role, User};
use firefleet_core::{StationId, UserId};

/// Authenticated caller for a request.
///
/// Built by the auth middleware from the stored user record (not from the
/// token's claims), so role changes and deletions take effect immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    user: User,
    principal: Principal,
}

impl CurrentUser {
    pub fn new(user: User) -> Self {
        let principal = Principal::for_role(user.id, user.role);
        Self { user, principal }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_manager(&self) -> bool {
        self.user.is_manager()
    }

    pub fn station_id(&self) -> Option<StationId> {
        self.user.station_id
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
