//! # atlas-auth
//!
//! The authentication boundary: JWT issue/verify with a role claim,
//! token revocation, argon2 password hashing and the role model used to
//! gate content mutation. Route guards live in the API layer ahead of
//! the content coordinator; the coordinator never re-checks authorization.

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{extract_bearer_token, Claims, JwtError, JwtService, RevokedTokens};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{CurrentUser, Role};
