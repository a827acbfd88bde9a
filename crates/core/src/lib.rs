//! `firefleet-core`: fleet domain building blocks.
//!
//! This crate contains **pure domain** records and rules (no infrastructure
//! concerns): identifiers, validation, document expiry and statistics.

pub mod dates;
pub mod entity;
pub mod error;
pub mod id;
pub mod model;
pub mod stats;

pub use entity::{Document, Entity};
pub use error::{DomainError, DomainResult};
pub use id::{
    AssignmentId, EquipmentId, FaultId, FaultTypeId, NotificationId, RecordId, RequestId,
    ServiceId, StationId, UserId, VehicleId,
};
pub use stats::{DashboardStats, FaultTypeCount, VehicleGroupCount};
