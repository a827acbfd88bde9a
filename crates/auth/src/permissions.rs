use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "fleet.read").
/// A special wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission::from_static("*");

    /// Read stations, vehicles, services, fault types, faults and users.
    pub const FLEET_READ: Permission = Permission::from_static("fleet.read");
    /// Create / edit / delete stations, vehicles, services and fault types.
    pub const FLEET_WRITE: Permission = Permission::from_static("fleet.write");
    pub const USERS_MANAGE: Permission = Permission::from_static("users.manage");
    pub const FAULTS_REPORT: Permission = Permission::from_static("faults.report");
    pub const FAULTS_MANAGE: Permission = Permission::from_static("faults.manage");
    pub const ASSIGNMENTS_MANAGE: Permission = Permission::from_static("assignments.manage");
    pub const REQUESTS_CREATE: Permission = Permission::from_static("requests.create");
    pub const REQUESTS_RESPOND: Permission = Permission::from_static("requests.respond");
    pub const NOTIFICATIONS_MANAGE: Permission = Permission::from_static("notifications.manage");
    pub const DASHBOARD_READ: Permission = Permission::from_static("dashboard.read");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
