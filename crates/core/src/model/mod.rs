//! Fleet records persisted in the document store.
//!
//! Each record owns its creation input (`New*`) and partial-update (`*Patch`)
//! shapes so validation lives next to the data it guards.

/// Declares a closed, snake_case string enumeration with `as_str`,
/// `Display` and a validating `FromStr`.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = $crate::error::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::error::DomainError::validation(format!(
                        "{} must be one of: {}",
                        $field,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

pub(crate) use string_enum;

pub mod assignment;
pub mod fault;
pub mod notification;
pub mod request;
pub mod service;
pub mod station;
pub mod user;
pub mod vehicle;

pub use assignment::{Assignment, AssignmentPatch, NewAssignment};
pub use fault::{
    Fault, FaultPatch, FaultStatus, FaultType, FaultTypePatch, NewFault, NewFaultType, Priority,
};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use request::{NewRequest, Request, RequestResponse, RequestStatus};
pub use service::{NewService, Service, ServicePatch};
pub use station::{NewStation, Station, StationPatch};
pub use user::{NewUser, PublicUser, Role, User, UserPatch};
pub use vehicle::{
    AccidentRecord, EXPIRY_WINDOW_DAYS, Equipment, ExpiringDocument, MaintenanceKind,
    MaintenanceRecord, NewAccident, NewEquipment, NewMaintenance, NewVehicle, Vehicle,
    VehicleDocument, VehiclePatch, VehicleStatus, newest_first,
};

/// Trim an optional text field, mapping blank strings to `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
