use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::{parse_optional, validate_date, validate_optional_date};
use crate::error::{DomainError, DomainResult, require_text};
use crate::id::{AssignmentId, UserId, VehicleId, blank_as_none};

use super::clean;

/// Binds a driver to a vehicle for a mission over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub vehicle_id: VehicleId,
    pub driver_id: UserId,
    pub assigned_by: UserId,
    pub start_date: String,
    pub end_date: Option<String>,
    pub mission_type: String,
    pub location: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

crate::document!(Assignment, AssignmentId, "assignments");

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub vehicle_id: VehicleId,
    pub driver_id: UserId,
    pub start_date: String,
    pub end_date: Option<String>,
    pub mission_type: String,
    pub location: String,
    pub notes: Option<String>,
}

impl NewAssignment {
    pub fn validate(&self) -> DomainResult<()> {
        validate_date("start_date", &self.start_date)?;
        validate_optional_date("end_date", self.end_date.as_deref())?;
        require_text("mission_type", &self.mission_type)?;
        require_text("location", &self.location)?;
        validate_window(Some(&self.start_date), self.end_date.as_deref())
    }

    pub fn into_assignment(self, assigned_by: UserId, now: DateTime<Utc>) -> Assignment {
        Assignment {
            id: AssignmentId::new(),
            vehicle_id: self.vehicle_id,
            driver_id: self.driver_id,
            assigned_by,
            start_date: self.start_date.trim().to_string(),
            end_date: clean(self.end_date),
            mission_type: self.mission_type.trim().to_string(),
            location: self.location.trim().to_string(),
            notes: clean(self.notes),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentPatch {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub vehicle_id: Option<VehicleId>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub driver_id: Option<UserId>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub mission_type: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.vehicle_id.is_none()
            && self.driver_id.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.mission_type.is_none()
            && self.location.is_none()
            && self.notes.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(start) = &self.start_date {
            validate_date("start_date", start)?;
        }
        validate_optional_date("end_date", self.end_date.as_deref())?;
        if let Some(mission_type) = &self.mission_type {
            require_text("mission_type", mission_type)?;
        }
        if let Some(location) = &self.location {
            require_text("location", location)?;
        }
        Ok(())
    }

    /// Apply the patch, re-checking the window against the merged record.
    pub fn apply(&self, assignment: &mut Assignment) -> DomainResult<()> {
        let start = self.start_date.as_deref().unwrap_or(&assignment.start_date);
        let end = match &self.end_date {
            Some(end) => Some(end.as_str()),
            None => assignment.end_date.as_deref(),
        };
        validate_window(Some(start), end)?;

        if let Some(vehicle_id) = self.vehicle_id {
            assignment.vehicle_id = vehicle_id;
        }
        if let Some(driver_id) = self.driver_id {
            assignment.driver_id = driver_id;
        }
        if let Some(start) = &self.start_date {
            assignment.start_date = start.trim().to_string();
        }
        if self.end_date.is_some() {
            assignment.end_date = clean(self.end_date.clone());
        }
        if let Some(mission_type) = &self.mission_type {
            assignment.mission_type = mission_type.trim().to_string();
        }
        if let Some(location) = &self.location {
            assignment.location = location.trim().to_string();
        }
        if self.notes.is_some() {
            assignment.notes = clean(self.notes.clone());
        }
        Ok(())
    }
}

fn validate_window(start: Option<&str>, end: Option<&str>) -> DomainResult<()> {
    if let (Some(start), Some(end)) = (parse_optional(start), parse_optional(end)) {
        if end < start {
            return Err(DomainError::validation("end_date must not precede start_date"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewAssignment {
        NewAssignment {
            vehicle_id: VehicleId::new(),
            driver_id: UserId::new(),
            start_date: "2025-06-01".into(),
            end_date: Some("2025-06-02".into()),
            mission_type: "Yangın".into(),
            location: "Çankaya".into(),
            notes: None,
        }
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut bad = input();
        bad.end_date = Some("2025-05-01".into());
        assert!(matches!(bad.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_checks_merged_window() {
        let mut assignment = input().into_assignment(UserId::new(), Utc::now());
        let patch = AssignmentPatch {
            start_date: Some("2025-07-01".into()),
            ..Default::default()
        };
        assert!(patch.apply(&mut assignment).is_err());
        assert_eq!(assignment.start_date, "2025-06-01");

        let patch = AssignmentPatch {
            end_date: Some("2025-06-10".into()),
            ..Default::default()
        };
        patch.apply(&mut assignment).unwrap();
        assert_eq!(assignment.end_date.as_deref(), Some("2025-06-10"));
    }
}
