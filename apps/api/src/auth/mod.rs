//! Admin authentication: password hashing, JWT issuance/verification, and
//! the `require_admin` middleware guarding content mutations.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod store;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use middleware::{require_admin, AuthAdmin};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin user id.
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Longest session a token may grant (one year).
pub const MAX_EXPIRY_HOURS: i64 = 24 * 365;

/// Signing material for admin session tokens (HS256).
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: i64,
}

impl JwtKeys {
    /// `expiry_hours` is clamped to `1..=MAX_EXPIRY_HOURS`.
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours: expiry_hours.clamp(1, MAX_EXPIRY_HOURS),
        }
    }

    /// Token lifetime in seconds, reported to clients as `expires_in`.
    pub fn expires_in(&self) -> i64 {
        self.expiry_hours * 3600
    }

    pub fn issue(&self, admin_id: Uuid, email: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: admin_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| JwtError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify() {
        let keys = JwtKeys::new("test-secret", 24);
        let id = Uuid::new_v4();
        let token = keys.issue(id, "ada@example.com").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtKeys::new("one", 1).issue(Uuid::new_v4(), "a@b.co").unwrap();
        assert!(matches!(
            JwtKeys::new("two", 1).verify(&token),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new("test-secret", 1);
        let now = Utc::now().timestamp();
        let token = keys
            .sign(&Claims {
                sub: Uuid::new_v4(),
                email: "a@b.co".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_rejected() {
        let keys = JwtKeys::new("test-secret", 1);
        assert!(matches!(keys.verify("not.a.jwt"), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_expires_in_seconds() {
        assert_eq!(JwtKeys::new("s", 2).expires_in(), 7200);
    }

    #[test]
    fn test_out_of_range_expiry_clamped() {
        let long = JwtKeys::new("s", i64::MAX);
        assert_eq!(long.expires_in(), MAX_EXPIRY_HOURS * 3600);
        let token = long.issue(Uuid::new_v4(), "a@b.co").unwrap();
        assert!(long.verify(&token).is_ok());

        let negative = JwtKeys::new("s", -5);
        let token = negative.issue(Uuid::new_v4(), "a@b.co").unwrap();
        assert!(negative.verify(&token).is_ok());
    }
}
