//! HS256 token codec.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use firefleet_core::UserId;

use crate::{JwtClaims, Role, TokenValidationError, validate_claims};

/// Default token lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong algorithm or undecodable payload.
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Verifies bearer tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Symmetric HS256 issuer + validator.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl Hs256Jwt {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` valid from `now` for the configured TTL.
    pub fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = JwtClaims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        // Time-window checks run through `validate_claims` against the
        // caller's clock, so jsonwebtoken only verifies the signature.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> Hs256Jwt {
        Hs256Jwt::new(b"test-secret", Duration::hours(DEFAULT_TTL_HOURS))
    }

    #[test]
    fn issued_token_validates() {
        let user = UserId::new();
        let now = Utc::now();
        let token = codec().issue(user, Role::Manager, now).unwrap();
        let claims = codec().validate(&token, now).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TTL_HOURS * 3600);
    }

    #[test]
    fn token_expires_after_ttl() {
        let now = Utc::now();
        let token = codec().issue(UserId::new(), Role::Driver, now).unwrap();
        let later = now + Duration::hours(DEFAULT_TTL_HOURS) + Duration::seconds(1);
        assert_eq!(
            codec().validate(&token, later),
            Err(TokenError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let now = Utc::now();
        let other = Hs256Jwt::new(b"another-secret", Duration::hours(1));
        let token = other.issue(UserId::new(), Role::Manager, now).unwrap();
        assert!(matches!(codec().validate(&token, now), Err(TokenError::Invalid(_))));
        assert!(matches!(codec().validate("garbage", now), Err(TokenError::Invalid(_))));
    }
}
