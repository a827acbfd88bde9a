use firefleet_core::UserId;

use crate::{Permission, Role, permissions_for};

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Resolve a principal from its role using the static policy.
    pub fn for_role(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            permissions: permissions_for(role),
        }
    }
}
