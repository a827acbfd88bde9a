pub use firefleet_core::model::Role;

use crate::Permission;

/// Static role-to-permission policy.
///
/// Managers get the wildcard; drivers can read the fleet, report faults,
/// raise requests and manage their own notifications.
pub fn permissions_for(role: Role) -> Vec<Permission> {
    match role {
        Role::Manager => vec![Permission::WILDCARD],
        Role::Driver => vec![
            Permission::FLEET_READ,
            Permission::DASHBOARD_READ,
            Permission::FAULTS_REPORT,
            Permission::REQUESTS_CREATE,
            Permission::NOTIFICATIONS_MANAGE,
        ],
    }
}
