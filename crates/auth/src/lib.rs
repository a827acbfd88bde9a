//! `firefleet-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, AuthzError};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtValidator, TokenError};
pub use password::{PasswordError, hash_password, validate_password, verify_password};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{Role, permissions_for};
