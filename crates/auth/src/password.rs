//! Password hashing using Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LEN} characters long")]
    TooShort,

    #[error("failed to hash password: {0}")]
    HashError(String),

    #[error("failed to verify password: {0}")]
    VerifyError(String),

    #[error("invalid password hash format")]
    InvalidHash,
}

/// Registration-time password policy.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verify a password against a stored PHC hash. A mismatch is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("surucu123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("surucu123", &hash).unwrap());
        assert!(!verify_password("amir123", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        assert_ne!(hash_password("amir123").unwrap(), hash_password("amir123").unwrap());
    }

    #[test]
    fn invalid_hash_format() {
        assert_eq!(verify_password("x", "plaintext"), Err(PasswordError::InvalidHash));
    }

    #[test]
    fn minimum_length() {
        assert_eq!(validate_password("12345"), Err(PasswordError::TooShort));
        assert!(validate_password("123456").is_ok());
    }
}
