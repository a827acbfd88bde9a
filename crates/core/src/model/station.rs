use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult, require_text};
use crate::id::{StationId, UserId, blank_as_none};

use super::clean;

/// A physical fire-station location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub internal_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub manager_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

crate::document!(Station, StationId, "stations");

#[derive(Debug, Clone, Deserialize)]
pub struct NewStation {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub internal_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub manager_id: Option<UserId>,
}

impl NewStation {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("address", &self.address)?;
        require_text("phone", &self.phone)?;
        validate_coordinates(self.latitude, self.longitude)
    }

    pub fn into_station(self, now: DateTime<Utc>) -> Station {
        Station {
            id: StationId::new(),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            internal_number: clean(self.internal_number),
            latitude: self.latitude,
            longitude: self.longitude,
            manager_id: self.manager_id,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub internal_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub manager_id: Option<UserId>,
}

impl StationPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.internal_number.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.manager_id.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(address) = &self.address {
            require_text("address", address)?;
        }
        if let Some(phone) = &self.phone {
            require_text("phone", phone)?;
        }
        validate_coordinates(self.latitude, self.longitude)
    }

    pub fn apply(&self, station: &mut Station) {
        if let Some(name) = &self.name {
            station.name = name.trim().to_string();
        }
        if let Some(address) = &self.address {
            station.address = address.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            station.phone = phone.trim().to_string();
        }
        if self.internal_number.is_some() {
            station.internal_number = clean(self.internal_number.clone());
        }
        if self.latitude.is_some() {
            station.latitude = self.latitude;
        }
        if self.longitude.is_some() {
            station.longitude = self.longitude;
        }
        if self.manager_id.is_some() {
            station.manager_id = self.manager_id;
        }
    }
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> DomainResult<()> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(DomainError::validation("latitude must be within [-90, 90]"));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(DomainError::validation("longitude must be within [-180, 180]"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let patch = StationPatch {
            latitude: Some(120.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut station = NewStation {
            name: "Ankara Merkez".into(),
            address: "Ulus, Ankara".into(),
            phone: "+90 312 123 4567".into(),
            internal_number: Some("1001".into()),
            latitude: Some(39.93),
            longitude: Some(32.85),
            manager_id: None,
        }
        .into_station(Utc::now());

        let patch = StationPatch {
            phone: Some("+90 312 000 0000".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut station);

        assert_eq!(station.phone, "+90 312 000 0000");
        assert_eq!(station.name, "Ankara Merkez");
        assert_eq!(station.internal_number.as_deref(), Some("1001"));
    }
}
