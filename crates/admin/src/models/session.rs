//! Session-related types for staff authentication.

use serde::{Deserialize, Serialize};

use glowhaus_api::AuthSession;
use glowhaus_core::UserId;

/// Session-stored staff identity.
///
/// Only set after the API confirmed the account is staff. The API still
/// checks every call against the token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStaff {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl CurrentStaff {
    /// Staff identity from a sign-in, or `None` when the account is not
    /// staff. Either the token's `is_staff` claim or the profile flag is
    /// enough.
    #[must_use]
    pub fn from_auth(auth: &AuthSession) -> Option<Self> {
        let profile_staff = auth.user.as_ref().is_some_and(|u| u.is_staff);
        if !auth.claims.is_staff && !profile_staff {
            return None;
        }

        Some(match &auth.user {
            Some(user) => Self {
                id: user.id,
                email: user.email.clone(),
                name: user.display_name(),
            },
            None => {
                let email = auth.claims.email.clone().unwrap_or_default();
                let name = [&auth.claims.first_name, &auth.claims.last_name]
                    .into_iter()
                    .flatten()
                    .map(|part| part.trim())
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                Self {
                    id: auth.claims.user_id,
                    name: if name.is_empty() { email.clone() } else { name },
                    email,
                }
            }
        })
    }
}

/// Session keys for staff data.
pub mod keys {
    /// JWT access/refresh pair.
    pub const TOKENS: &str = "tokens";

    /// Key for storing the signed-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";

    /// One-shot confirmation shown on the next page.
    pub const FLASH: &str = "flash";
}
