use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult, require_text};
use crate::id::{StationId, UserId, blank_as_none};

use super::{clean, string_enum};

string_enum!(
    /// Role of an account. Drivers operate vehicles; managers administer the fleet.
    Role, "role" {
        Driver => "driver",
        Manager => "manager",
    }
);

/// A stored user account, including its password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub station_id: Option<StationId>,
    pub sicil_no: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

crate::document!(User, UserId, "users");

impl User {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// Client-facing view (never carries the password hash).
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            station_id: self.station_id,
            sicil_no: self.sicil_no.clone(),
            phone: self.phone.clone(),
            created_at: self.created_at,
        }
    }
}

/// User as returned over the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub station_id: Option<StationId>,
    pub sicil_no: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile fields supplied at registration.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub station_id: Option<StationId>,
    pub sicil_no: Option<String>,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        validate_email(&self.email)
    }

    pub fn into_user(self, password_hash: String, now: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            email: normalize_email(&self.email),
            name: self.name.trim().to_string(),
            role: self.role,
            station_id: self.station_id,
            sicil_no: clean(self.sicil_no),
            phone: clean(self.phone),
            password_hash,
            created_at: now,
        }
    }
}

/// Manager-side edit of a user profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub station_id: Option<StationId>,
    pub sicil_no: Option<String>,
    pub phone: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.role.is_none()
            && self.station_id.is_none()
            && self.sicil_no.is_none()
            && self.phone.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        Ok(())
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.trim().to_string();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(station_id) = self.station_id {
            user.station_id = Some(station_id);
        }
        if self.sicil_no.is_some() {
            user.sicil_no = clean(self.sicil_no.clone());
        }
        if self.phone.is_some() {
            user.phone = clean(self.phone.clone());
        }
    }
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation("email is not a valid address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Ali Kaya".to_string(),
            role: Role::Driver,
            station_id: None,
            sicil_no: Some("  ".to_string()),
            phone: Some(" +90 532 111 0001 ".to_string()),
        }
    }

    #[test]
    fn registration_normalizes_fields() {
        let input = new_user(" Ali.Kaya@Itfaiye.gov.tr ");
        input.validate().unwrap();
        let user = input.into_user("hash".to_string(), Utc::now());
        assert_eq!(user.email, "ali.kaya@itfaiye.gov.tr");
        assert_eq!(user.sicil_no, None);
        assert_eq!(user.phone.as_deref(), Some("+90 532 111 0001"));
    }

    #[test]
    fn rejects_malformed_email() {
        for bad in ["", "nobody", "a@b", "@itfaiye.gov.tr", "a b@c.d"] {
            assert!(new_user(bad).validate().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn public_view_drops_password_hash() {
        let user = new_user("a@b.co").into_user("secret-hash".to_string(), Utc::now());
        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "driver");
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("admin".parse::<Role>().is_err());
    }
}
