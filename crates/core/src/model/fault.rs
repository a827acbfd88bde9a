use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainResult, require_text};
use crate::id::{FaultId, FaultTypeId, ServiceId, UserId, VehicleId, blank_as_none};

use super::{clean, string_enum};

string_enum!(
    /// Lifecycle of a reported fault.
    FaultStatus, "status" {
        Pending => "pending",
        InProgress => "in_progress",
        Resolved => "resolved",
    }
);

string_enum!(
    Priority, "priority" {
        Low => "low",
        Normal => "normal",
        High => "high",
        Urgent => "urgent",
    }
);

/// A category of fault (engine, brakes, pump...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultType {
    pub id: FaultTypeId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

crate::document!(FaultType, FaultTypeId, "fault_types");

#[derive(Debug, Clone, Deserialize)]
pub struct NewFaultType {
    pub name: String,
    pub description: Option<String>,
}

impl NewFaultType {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)
    }

    pub fn into_fault_type(self, now: DateTime<Utc>) -> FaultType {
        FaultType {
            id: FaultTypeId::new(),
            name: self.name.trim().to_string(),
            description: clean(self.description),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaultTypePatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl FaultTypePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        match &self.name {
            Some(name) => require_text("name", name),
            None => Ok(()),
        }
    }

    pub fn apply(&self, fault_type: &mut FaultType) {
        if let Some(name) = &self.name {
            fault_type.name = name.trim().to_string();
        }
        if self.description.is_some() {
            fault_type.description = clean(self.description.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    pub id: FaultId,
    pub vehicle_id: VehicleId,
    pub reported_by: UserId,
    pub fault_type_id: Option<FaultTypeId>,
    pub description: String,
    pub status: FaultStatus,
    pub priority: Priority,
    pub service_id: Option<ServiceId>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

crate::document!(Fault, FaultId, "faults");

impl Fault {
    pub fn is_open(&self) -> bool {
        self.status != FaultStatus::Resolved
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFault {
    pub vehicle_id: VehicleId,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub fault_type_id: Option<FaultTypeId>,
    pub description: String,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub service_id: Option<ServiceId>,
}

impl NewFault {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("description", &self.description)
    }

    pub fn into_fault(self, reported_by: UserId, now: DateTime<Utc>) -> Fault {
        Fault {
            id: FaultId::new(),
            vehicle_id: self.vehicle_id,
            reported_by,
            fault_type_id: self.fault_type_id,
            description: self.description.trim().to_string(),
            status: FaultStatus::Pending,
            priority: self.priority.unwrap_or(Priority::Normal),
            service_id: self.service_id,
            resolution_notes: None,
            resolved_at: None,
            created_at: now,
        }
    }
}

/// Manager-side progress update on a fault.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaultPatch {
    pub status: Option<FaultStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub service_id: Option<ServiceId>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub fault_type_id: Option<FaultTypeId>,
    pub resolution_notes: Option<String>,
}

impl FaultPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.service_id.is_none()
            && self.fault_type_id.is_none()
            && self.resolution_notes.is_none()
    }

    /// Apply the patch. Returns `true` when this call moved the fault into
    /// `resolved`.
    pub fn apply(&self, fault: &mut Fault, now: DateTime<Utc>) -> bool {
        let was_open = fault.is_open();
        if let Some(status) = self.status {
            fault.status = status;
        }
        if let Some(priority) = self.priority {
            fault.priority = priority;
        }
        if self.service_id.is_some() {
            fault.service_id = self.service_id;
        }
        if self.fault_type_id.is_some() {
            fault.fault_type_id = self.fault_type_id;
        }
        if self.resolution_notes.is_some() {
            fault.resolution_notes = clean(self.resolution_notes.clone());
        }

        if fault.is_open() {
            fault.resolved_at = None;
            false
        } else {
            if was_open || fault.resolved_at.is_none() {
                fault.resolved_at = Some(now);
            }
            was_open
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fault() -> Fault {
        NewFault {
            vehicle_id: VehicleId::new(),
            fault_type_id: None,
            description: " Pump pressure drops ".into(),
            priority: None,
            service_id: None,
        }
        .into_fault(UserId::new(), Utc::now())
    }

    #[test]
    fn reported_fault_starts_pending_with_normal_priority() {
        let f = fault();
        assert_eq!(f.status, FaultStatus::Pending);
        assert_eq!(f.priority, Priority::Normal);
        assert_eq!(f.description, "Pump pressure drops");
    }

    #[test]
    fn resolving_stamps_resolved_at_once() {
        let mut f = fault();
        let now = Utc::now();
        let patch = FaultPatch {
            status: Some(FaultStatus::Resolved),
            resolution_notes: Some("Seal replaced".into()),
            ..Default::default()
        };
        assert!(patch.apply(&mut f, now));
        assert_eq!(f.resolved_at, Some(now));

        // A second resolve keeps the original timestamp.
        assert!(!patch.apply(&mut f, now + Duration::hours(1)));
        assert_eq!(f.resolved_at, Some(now));
    }

    #[test]
    fn reopening_clears_resolved_at() {
        let mut f = fault();
        FaultPatch {
            status: Some(FaultStatus::Resolved),
            ..Default::default()
        }
        .apply(&mut f, Utc::now());

        FaultPatch {
            status: Some(FaultStatus::InProgress),
            ..Default::default()
        }
        .apply(&mut f, Utc::now());
        assert!(f.is_open());
        assert_eq!(f.resolved_at, None);
    }

    #[test]
    fn status_wire_names_are_snake_case() {
        assert_eq!(serde_json::to_value(FaultStatus::InProgress).unwrap(), "in_progress");
        assert_eq!("IN_PROGRESS".parse::<FaultStatus>().unwrap(), FaultStatus::InProgress);
    }

    #[test]
    fn unselected_type_and_service_post_as_blank_strings() {
        let vehicle_id = VehicleId::new();
        let body = serde_json::json!({
            "vehicle_id": vehicle_id,
            "fault_type_id": "",
            "service_id": "",
            "description": "Siren silent",
        });
        let new: NewFault = serde_json::from_value(body).unwrap();
        assert_eq!(new.fault_type_id, None);
        assert_eq!(new.service_id, None);

        let service_id = ServiceId::new();
        let body = serde_json::json!({
            "vehicle_id": vehicle_id,
            "description": "Siren silent",
            "service_id": service_id,
        });
        let fault = serde_json::from_value::<NewFault>(body)
            .unwrap()
            .into_fault(UserId::new(), Utc::now());
        assert_eq!(fault.service_id, Some(service_id));
    }
}
