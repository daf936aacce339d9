//! JWT tokens, decoded claims, and token storage.

mod claims;
mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use claims::{AccessClaims, EXPIRY_SKEW_SECS};
pub use store::{MemoryTokenStore, TokenStore};

use crate::ApiError;

/// Access and refresh tokens issued by `/auth/login/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access: String,
    /// Long-lived token exchanged at `/auth/token/refresh/`.
    pub refresh: String,
}

impl TokenPair {
    #[must_use]
    pub const fn new(access: String, refresh: String) -> Self {
        Self { access, refresh }
    }

    /// Decode the access token's claims.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidToken` if the token is malformed.
    pub fn claims(&self) -> Result<AccessClaims, ApiError> {
        AccessClaims::decode(&self.access)
    }

    /// Whether the access token is expired (or about to be).
    ///
    /// Tokens whose claims cannot be read are treated as live; the API's
    /// 401 is the authority for those.
    #[must_use]
    pub fn access_expired(&self) -> bool {
        self.claims().is_ok_and(|claims| claims.is_expired())
    }
}

// Manual Debug impl to avoid leaking tokens into logs.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_tokens() {
        let pair = TokenPair::new("secret-access".to_owned(), "secret-refresh".to_owned());
        let debug = format!("{pair:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_opaque_access_token_is_not_expired() {
        let pair = TokenPair::new("not-a-jwt".to_owned(), "r".to_owned());
        assert!(pair.claims().is_err());
        assert!(!pair.access_expired());
    }
}
