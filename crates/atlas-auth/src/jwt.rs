//! JWT issue and verification.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::permissions::Role;

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// JWT ID (for token revocation)
    pub jti: String,
    /// User role
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token is expired")]
    Expired,
    #[error("Token has been revoked")]
    Revoked,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Missing token")]
    Missing,
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),
}

/// Revoked token ids, shared across requests.
///
/// In-memory and per-instance only; entries survive until restart. A
/// shared keyed-expiry store would be needed for multi-instance
/// deployments.
#[derive(Default)]
pub struct RevokedTokens {
    ids: RwLock<HashSet<String>>,
}

impl RevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, jti: impl Into<String>) {
        self.ids.write().insert(jti.into());
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.ids.read().contains(jti)
    }
}

/// JWT service for creating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    revoked: RevokedTokens,
}

impl JwtService {
    /// Create a new JWT service with the given secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            revoked: RevokedTokens::new(),
        }
    }

    /// Create a new token carrying the user's role
    pub fn create_token(
        &self,
        user_id: i64,
        role: Role,
        email: Option<String>,
        expires_in_seconds: i64,
    ) -> Result<String, JwtError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))?
            .as_secs() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + expires_in_seconds as usize,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
            role,
            email,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate and decode a token, rejecting revoked ids
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;

        if self.revoked.is_revoked(&token_data.claims.jti) {
            return Err(JwtError::Revoked);
        }

        Ok(token_data.claims)
    }

    /// Revoke a token by its id, e.g. on logout
    pub fn revoke(&self, token: &str) -> Result<(), JwtError> {
        let claims = self.validate_token(token)?;
        self.revoked.revoke(claims.jti);
        Ok(())
    }

    /// Extract the user id from a validated token
    pub fn get_user_id(&self, token: &str) -> Result<i64, JwtError> {
        let claims = self.validate_token(token)?;
        claims
            .sub
            .parse()
            .map_err(|_| JwtError::Invalid("Invalid user ID in token".to_string()))
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    if authorization.to_lowercase().starts_with("bearer ") {
        Some(authorization[7..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes";

    #[test]
    fn test_create_and_validate_token() {
        let service = JwtService::new(SECRET);

        let token = service
            .create_token(1, Role::Editor, Some("test@example.com".into()), 3600)
            .unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.role, Role::Editor);
        assert_eq!(claims.email, Some("test@example.com".into()));
    }

    #[test]
    fn test_revoked_token_is_rejected() {
        let service = JwtService::new(SECRET);
        let token = service.create_token(1, Role::Member, None, 3600).unwrap();

        service.revoke(&token).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::Revoked)
        ));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let service = JwtService::new(SECRET);
        let other = JwtService::new(b"another-secret-key-also-32-bytes!");
        let token = other.create_token(1, Role::Admin, None, 3600).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }

    #[test]
    fn test_get_user_id() {
        let service = JwtService::new(SECRET);
        let token = service.create_token(42, Role::Member, None, 3600).unwrap();
        assert_eq!(service.get_user_id(&token).unwrap(), 42);
    }
}
