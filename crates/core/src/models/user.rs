//! User accounts and profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A user as returned by `/auth/profile/` and `/auth/users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, alias = "phone_number")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default = "super::default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
    /// Present on the staff customer listing.
    #[serde(default)]
    pub order_count: Option<u64>,
}

impl User {
    /// "First Last", or the email when no name is on file.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }

    /// Initials for the account badge.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            self.email
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default()
        } else {
            initials
        }
    }
}

/// Body of `PATCH /auth/profile/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(first: &str, last: &str) -> User {
        serde_json::from_value(json!({
            "id": 4,
            "email": "njeri@example.com",
            "first_name": first,
            "last_name": last,
        }))
        .unwrap()
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("Njeri", "Kamau").display_name(), "Njeri Kamau");
        assert_eq!(user("Njeri", "").display_name(), "Njeri");
        assert_eq!(user("", "").display_name(), "njeri@example.com");
    }

    #[test]
    fn test_initials() {
        assert_eq!(user("njeri", "kamau").initials(), "NK");
        assert_eq!(user("", "").initials(), "N");
    }

    #[test]
    fn test_defaults() {
        let u = user("", "");
        assert!(u.is_active);
        assert!(!u.is_staff);
        assert_eq!(u.phone, None);
    }
}
