use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult, require_text};
use crate::id::{RequestId, UserId};

use super::{clean, string_enum};

string_enum!(
    RequestStatus, "status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

/// A driver's message to a manager awaiting approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub requester_id: UserId,
    pub target_manager_id: UserId,
    pub title: String,
    pub description: String,
    pub status: RequestStatus,
    pub response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

crate::document!(Request, RequestId, "requests");

impl Request {
    pub fn involves(&self, user: UserId) -> bool {
        self.requester_id == user || self.target_manager_id == user
    }

    /// Record the manager's decision. A request can be answered only once.
    pub fn respond(&mut self, answer: &RequestResponse, now: DateTime<Utc>) -> DomainResult<()> {
        answer.validate()?;
        if self.status != RequestStatus::Pending {
            return Err(DomainError::conflict(format!(
                "request already {}",
                self.status
            )));
        }
        self.status = answer.status;
        self.response = clean(answer.response.clone());
        self.responded_at = Some(now);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRequest {
    pub target_manager_id: UserId,
    pub title: String,
    pub description: String,
}

impl NewRequest {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)
    }

    pub fn into_request(self, requester_id: UserId, now: DateTime<Utc>) -> Request {
        Request {
            id: RequestId::new(),
            requester_id,
            target_manager_id: self.target_manager_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            status: RequestStatus::Pending,
            response: None,
            responded_at: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestResponse {
    pub status: RequestStatus,
    pub response: Option<String>,
}

impl RequestResponse {
    fn validate(&self) -> DomainResult<()> {
        if self.status == RequestStatus::Pending {
            return Err(DomainError::validation(
                "status must be one of: approved, rejected",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        NewRequest {
            target_manager_id: UserId::new(),
            title: "Leave".into(),
            description: "Two days off next week".into(),
        }
        .into_request(UserId::new(), Utc::now())
    }

    #[test]
    fn answer_is_recorded_once() {
        let mut r = request();
        let approve = RequestResponse {
            status: RequestStatus::Approved,
            response: Some("ok".into()),
        };
        r.respond(&approve, Utc::now()).unwrap();
        assert_eq!(r.status, RequestStatus::Approved);
        assert!(r.responded_at.is_some());

        let err = r.respond(&approve, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn pending_is_not_an_answer() {
        let mut r = request();
        let err = r
            .respond(
                &RequestResponse {
                    status: RequestStatus::Pending,
                    response: None,
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
