//! Bearer token issue and verification.
//!
//! Tokens are HS256-signed and carry the user id in `sub`. There are no
//! refresh tokens; clients log in again once a token expires.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::error::{DomainError, DomainResult};

pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_EXPIRY_SECONDS: u64 = 3600;

const DEV_SECRET: &str = "bookswap-dev-secret-not-for-production-use";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    expiry_seconds: u64,
}

impl JwtManager {
    pub fn new(secret: String, expiry_seconds: u64) -> DomainResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(DomainError::Internal(format!(
                "JWT secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Fixed, publicly known secret for local development and tests
    pub fn new_dev(expiry_seconds: u64) -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            expiry_seconds,
        }
    }

    pub fn issue(&self, user_id: &str, username: &str) -> DomainResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DomainError::Internal(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| DomainError::Internal(format!("Failed to generate token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> DomainResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid token signature",
                _ => "Invalid token",
            };
            DomainError::unauthorized(reason)
        })
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret-that-is-at-least-32-characters-long".into(), 60).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = manager();
        let token = jwt.issue("user-1", "alice").unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_rejects_short_secret() {
        assert!(JwtManager::new("short".into(), 60).is_err());
    }

    #[test]
    fn test_rejects_foreign_and_garbage_tokens() {
        let token = JwtManager::new_dev(60).issue("user-1", "alice").unwrap();
        assert!(matches!(manager().verify(&token), Err(DomainError::Unauthorized(_))));
        assert!(matches!(manager().verify("garbage"), Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_rejects_expired_token() {
        let jwt = manager();
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let claims = Claims {
            sub: "user-1".into(),
            username: "alice".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-that-is-at-least-32-characters-long"),
        )
        .unwrap();
        assert!(matches!(jwt.verify(&token), Err(DomainError::Unauthorized(msg)) if msg == "Token expired"));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer  "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
