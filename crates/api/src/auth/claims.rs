//! Access token claims.
//!
//! The client only reads its own token to learn who is signed in and when
//! the token expires. Signatures are verified by the API on every request,
//! so the client decodes without a key.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};

use glowhaus_core::UserId;

use crate::ApiError;

/// Seconds before `exp` at which a token is already treated as expired.
pub const EXPIRY_SKEW_SECS: i64 = 30;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(deserialize_with = "user_id_from_number_or_string")]
    pub user_id: UserId,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl AccessClaims {
    /// Decode claims without verifying the signature or expiry.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidToken` if the token is not a well-formed JWT
    /// or lacks `user_id`/`exp`.
    pub fn decode(token: &str) -> Result<Self, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Self>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    /// Whether the token is expired at `now`, allowing for clock skew.
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now + EXPIRY_SKEW_SECS >= self.exp
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

fn user_id_from_number_or_string<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(id) => Ok(UserId::new(id)),
        Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    fn sign(claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"backend-only-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_without_knowing_the_key() {
        let exp = Utc::now().timestamp() + 600;
        let token = sign(&json!({
            "token_type": "access",
            "user_id": 42,
            "exp": exp,
            "email": "wanjiru@example.com",
            "is_staff": true
        }));

        let claims = AccessClaims::decode(&token).unwrap();
        assert_eq!(claims.user_id, UserId::new(42));
        assert_eq!(claims.exp, exp);
        assert!(claims.is_staff);
        assert_eq!(claims.email.as_deref(), Some("wanjiru@example.com"));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_string_user_id() {
        let token = sign(&json!({"user_id": "17", "exp": 1}));
        assert_eq!(AccessClaims::decode(&token).unwrap().user_id, UserId::new(17));
    }

    #[test]
    fn test_expired_token_still_decodes() {
        let token = sign(&json!({"user_id": 1, "exp": 1_000}));
        let claims = AccessClaims::decode(&token).unwrap();
        assert!(claims.is_expired());
    }

    #[test]
    fn test_expiry_skew() {
        let token = sign(&json!({"user_id": 1, "exp": 10_000}));
        let claims = AccessClaims::decode(&token).unwrap();
        assert!(!claims.is_expired_at(10_000 - EXPIRY_SKEW_SECS - 1));
        assert!(claims.is_expired_at(10_000 - EXPIRY_SKEW_SECS));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(AccessClaims::decode("abc.def").is_err());
        let token = sign(&json!({"exp": 10}));
        assert!(AccessClaims::decode(&token).is_err());
    }
}
