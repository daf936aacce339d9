//! Sign-in, registration, and profile endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use glowhaus_core::models::{ProfileUpdate, User};

use crate::auth::{AccessClaims, TokenPair, TokenStore};
use crate::client::{ApiClient, ApiRequest};
use crate::ApiError;

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub claims: AccessClaims,
    /// Profile, when the API includes it in the response.
    pub user: Option<User>,
}

/// New account details.
#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password: SecretString,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<&'a str>,
    password: &'a str,
    password2: &'a str,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh: &'a str,
}

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

#[derive(Deserialize)]
struct RawTokens {
    access: String,
    refresh: String,
}

/// Login and registration responses put tokens either at the top level or
/// under `tokens`.
#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    tokens: Option<RawTokens>,
    #[serde(default)]
    user: Option<User>,
}

impl AuthResponse {
    fn into_session(self) -> Result<Option<AuthSession>, ApiError> {
        let tokens = match (self.tokens, self.access, self.refresh) {
            (Some(raw), _, _) => TokenPair::new(raw.access, raw.refresh),
            (None, Some(access), Some(refresh)) => TokenPair::new(access, refresh),
            _ => return Ok(None),
        };
        let claims = tokens.claims()?;
        Ok(Some(AuthSession {
            tokens,
            claims,
            user: self.user,
        }))
    }
}

impl ApiClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` (or `Validation`) for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthSession, ApiError> {
        let request = ApiRequest::post("/auth/login/").json(&LoginRequest {
            email,
            password: password.expose_secret(),
        })?;
        let response: AuthResponse = self.send_public(request).await?;
        response.into_session()?.ok_or(ApiError::MissingTokens)
    }

    /// Create an account and sign in.
    ///
    /// When the API does not return tokens on registration, signs in with
    /// the new credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with per-field messages when the API
    /// rejects the details.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        let password = registration.password.expose_secret();
        let request = ApiRequest::post("/auth/register/").json(&RegisterRequest {
            email: &registration.email,
            first_name: &registration.first_name,
            last_name: &registration.last_name,
            phone_number: registration.phone.as_deref(),
            password,
            password2: password,
        })?;
        let response: AuthResponse = self.send_public(request).await?;

        match response.into_session()? {
            Some(session) => Ok(session),
            None => self.login(&registration.email, &registration.password).await,
        }
    }

    /// Blacklist the refresh token and clear the store.
    ///
    /// Failures are logged; the local tokens are cleared regardless.
    #[instrument(skip_all)]
    pub async fn logout<S: TokenStore>(&self, store: &S) {
        if let Some(tokens) = store.load().await {
            let result = match ApiRequest::post("/auth/logout/").json(&LogoutRequest {
                refresh: &tokens.refresh,
            }) {
                Ok(request) => self.send_authed::<serde_json::Value, _>(store, request).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(error = %e, "Logout request failed; clearing tokens anyway");
            }
        }
        store.clear().await;
    }

    /// Current visitor's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn profile<S: TokenStore>(&self, store: &S) -> Result<User, ApiError> {
        self.send_authed(store, ApiRequest::get("/auth/profile/"))
            .await
    }

    /// Update the current visitor's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, update))]
    pub async fn update_profile<S: TokenStore>(
        &self,
        store: &S,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let request = ApiRequest::patch("/auth/profile/").json(update)?;
        self.send_authed(store, request).await
    }

    /// Change the current visitor's password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the old password is wrong or the
    /// new one is rejected.
    #[instrument(skip_all)]
    pub async fn change_password<S: TokenStore>(
        &self,
        store: &S,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/password/change/").json(&ChangePasswordRequest {
            old_password: old_password.expose_secret(),
            new_password: new_password.expose_secret(),
        })?;
        self.send_authed::<serde_json::Value, _>(store, request)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::test_support::FakeApi;
    use glowhaus_core::UserId;

    #[tokio::test]
    async fn test_login_decodes_tokens_and_claims() {
        let api = FakeApi::start().await;
        let session = api
            .client
            .login("amina@example.com", &SecretString::from("correct-horse".to_owned()))
            .await
            .unwrap();

        assert_eq!(session.claims.user_id, UserId::new(7));
        assert_eq!(session.tokens.refresh, "refresh-1");
        assert_eq!(session.user.unwrap().email, "amina@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let api = FakeApi::start().await;
        let err = api
            .client
            .login("amina@example.com", &SecretString::from("nope".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_register_without_tokens_falls_back_to_login() {
        let api = FakeApi::start().await;
        let registration = Registration {
            email: "amina@example.com".to_owned(),
            first_name: "Amina".to_owned(),
            last_name: "Otieno".to_owned(),
            phone: None,
            password: SecretString::from("correct-horse".to_owned()),
        };

        let session = api.client.register(&registration).await.unwrap();
        assert_eq!(session.tokens.refresh, "refresh-1");
    }

    #[tokio::test]
    async fn test_logout_clears_store_even_when_api_fails() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.revoked_pair("revoked"));

        api.client.logout(&store).await;
        assert!(store.load().await.is_none());
    }
}
