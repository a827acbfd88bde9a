use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::{NotificationId, UserId};

use super::string_enum;

string_enum!(
    NotificationKind, "type" {
        Fault => "fault",
        Expiry => "expiry",
        Assignment => "assignment",
        Request => "request",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    /// Id of the fault / assignment / request that triggered it.
    pub related_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

crate::document!(Notification, NotificationId, "notifications");

/// Server-generated notification, addressed before it is fanned out.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_id: Option<Uuid>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            related_id: None,
        }
    }

    pub fn related(mut self, id: impl Into<Uuid>) -> Self {
        self.related_id = Some(id.into());
        self
    }

    pub fn to_user(&self, user_id: UserId, now: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::new(),
            user_id,
            title: self.title.clone(),
            message: self.message.clone(),
            kind: self.kind,
            read: false,
            related_id: self.related_id,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FaultId;

    #[test]
    fn kind_serializes_as_type() {
        let fault = FaultId::new();
        let n = NewNotification::new(NotificationKind::Fault, "New fault", "Pump failure")
            .related(fault)
            .to_user(UserId::new(), Utc::now());
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "fault");
        assert_eq!(json["read"], false);
        assert_eq!(json["related_id"], fault.to_string());
        assert!(json.get("kind").is_none());
    }
}
