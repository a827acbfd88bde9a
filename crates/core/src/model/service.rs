use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainResult, require_text};
use crate::id::ServiceId;

use super::clean;

/// An external repair shop faults can be routed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
}

crate::document!(Service, ServiceId, "services");

#[derive(Debug, Clone, Deserialize)]
pub struct NewService {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub specialization: Option<String>,
}

impl NewService {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("address", &self.address)?;
        require_text("phone", &self.phone)
    }

    pub fn into_service(self, now: DateTime<Utc>) -> Service {
        Service {
            id: ServiceId::new(),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: clean(self.email),
            specialization: clean(self.specialization),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<String>,
}

impl ServicePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.specialization.is_none()
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
        Ok(())
    }

    pub fn apply(&self, service: &mut Service) {
        if let Some(name) = &self.name {
            service.name = name.trim().to_string();
        }
        if let Some(address) = &self.address {
            service.address = address.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            service.phone = phone.trim().to_string();
        }
        if self.email.is_some() {
            service.email = clean(self.email.clone());
        }
        if self.specialization.is_some() {
            service.specialization = clean(self.specialization.clone());
        }
    }
}
