//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype!(
    /// Identifier of a user account (driver or manager).
    UserId,
    "UserId"
);
uuid_newtype!(
    /// Identifier of a fire station.
    StationId,
    "StationId"
);
uuid_newtype!(VehicleId, "VehicleId");
uuid_newtype!(
    /// Identifier of an external repair service.
    ServiceId,
    "ServiceId"
);
uuid_newtype!(FaultTypeId, "FaultTypeId");
uuid_newtype!(FaultId, "FaultId");
uuid_newtype!(AssignmentId, "AssignmentId");
uuid_newtype!(RequestId, "RequestId");
uuid_newtype!(NotificationId, "NotificationId");
uuid_newtype!(
    /// Identifier of an equipment line item carried by a vehicle.
    EquipmentId,
    "EquipmentId"
);
uuid_newtype!(
    /// Identifier of an accident or maintenance record embedded in a vehicle.
    RecordId,
    "RecordId"
);

/// Deserialize an optional id where a blank string means "none".
///
/// Forms post `""` for an unselected reference. Use with
/// `#[serde(default, deserialize_with = "blank_as_none")]`.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = DomainError>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_what_it_displays() {
        let id = VehicleId::new();
        let parsed: VehicleId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn malformed_id_is_invalid_id_error() {
        let err = "not-a-uuid".parse::<StationId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.starts_with("StationId")));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = UserId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "blank_as_none")]
        station_id: Option<StationId>,
    }

    #[test]
    fn blank_reference_reads_as_none() {
        let body: Body = serde_json::from_str(r#"{"station_id": ""}"#).unwrap();
        assert_eq!(body.station_id, None);
        let body: Body = serde_json::from_str(r#"{"station_id": null}"#).unwrap();
        assert_eq!(body.station_id, None);
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.station_id, None);

        let id = StationId::new();
        let body: Body = serde_json::from_str(&format!(r#"{{"station_id": "{id}"}}"#)).unwrap();
        assert_eq!(body.station_id, Some(id));

        assert!(serde_json::from_str::<Body>(r#"{"station_id": "nope"}"#).is_err());
    }
}
