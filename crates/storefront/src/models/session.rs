//! Session-related types.
//!
//! Everything the storefront remembers about a visitor lives in their
//! `tower-sessions` record under the keys below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use glowhaus_api::AuthSession;
use glowhaus_core::models::User;
use glowhaus_core::{OrderId, PaymentStatus, UserId};

/// Session-stored identity of the signed-in visitor.
///
/// Used for the header and greeting; authorization is always the API's
/// call, via the token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl CurrentUser {
    /// Identity from a sign-in response, preferring the profile when present.
    #[must_use]
    pub fn from_auth(auth: &AuthSession) -> Self {
        match &auth.user {
            Some(user) => Self::from(user),
            None => Self {
                id: auth.claims.user_id,
                email: auth.claims.email.clone().unwrap_or_default(),
                first_name: auth.claims.first_name.clone().unwrap_or_default(),
                last_name: auth.claims.last_name.clone().unwrap_or_default(),
            },
        }
    }

    /// Name for greetings; falls back to the email address.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.email
        } else {
            &self.first_name
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// A payment the visitor is waiting on.
///
/// `started_at` anchors the polling timeout across page reloads. The watch
/// outlives polling: once the payment settles, `finished` holds the final
/// status and later visits render it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWatch {
    pub reference: String,
    pub order_id: Option<OrderId>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished: Option<PaymentStatus>,
}

impl PaymentWatch {
    #[must_use]
    pub fn start(reference: impl Into<String>, order_id: Option<OrderId>) -> Self {
        Self {
            reference: reference.into(),
            order_id,
            started_at: Utc::now(),
            finished: None,
        }
    }
}

/// Session keys.
pub mod keys {
    /// JWT access/refresh pair.
    pub const TOKENS: &str = "tokens";

    /// Key for storing the current signed-in visitor.
    pub const CURRENT_USER: &str = "current_user";

    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// Payment currently being polled.
    pub const PAYMENT_WATCH: &str = "payment_watch";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_name_falls_back_to_email() {
        let mut user = CurrentUser {
            id: UserId::new(7),
            email: "amina@example.com".to_string(),
            first_name: "Amina".to_string(),
            last_name: "Otieno".to_string(),
        };
        assert_eq!(user.greeting_name(), "Amina");

        user.first_name = " ".to_string();
        assert_eq!(user.greeting_name(), "amina@example.com");
    }

    #[test]
    fn test_payment_watch_round_trips_through_json() {
        let watch = PaymentWatch::start("ws_CO_1", Some(OrderId::new(12)));
        let json = serde_json::to_string(&watch).unwrap();
        let back: PaymentWatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, watch);
    }
}
