//! API error types.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Errors that can occur when calling the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response or request body was not valid JSON for the expected type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API rejected the input (HTTP 400).
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// No tokens are stored for this visitor.
    #[error("not signed in")]
    Unauthenticated,

    /// The API rejected the credentials (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The access token was rejected and could not be renewed.
    #[error("session expired")]
    SessionExpired,

    /// Authenticated but not allowed (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("API returned {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// First part of the response body.
        body: String,
    },

    /// An access token could not be decoded.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// A login or refresh response carried no tokens.
    #[error("authentication response did not include tokens")]
    MissingTokens,

    /// Configuration is invalid.
    #[error("invalid API configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether the API definitively refused the request, as opposed to a
    /// transport or server failure that may succeed on retry.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::Validation(_) | Self::Forbidden(_) | Self::NotFound
        )
    }

    /// Whether the visitor has to sign in again.
    #[must_use]
    pub const fn needs_login(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SessionExpired)
    }

    /// Field errors for re-rendering a form, if this is a validation error.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Per-field validation messages.
///
/// Decoded from DRF-style 400 bodies (`{"email": ["already taken"]}`) and
/// also built locally by form validation so both render the same way.
/// `detail` and `non_field_errors` land in [`FieldErrors::general`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
    general: Vec<String>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an error response body.
    ///
    /// Non-JSON bodies and unexpected shapes produce a single general message.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        let mut errors = Self::new();
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => {
                for (key, value) in map {
                    errors.collect(&key, &value);
                }
            }
            Ok(value @ (serde_json::Value::Array(_) | serde_json::Value::String(_))) => {
                errors.collect("non_field_errors", &value);
            }
            _ => {}
        }
        if errors.is_empty() {
            errors.push_general("The request was rejected. Please check your input.");
        }
        errors
    }

    fn collect(&mut self, key: &str, value: &serde_json::Value) {
        match value {
            serde_json::Value::String(message) => self.push(key, message),
            serde_json::Value::Array(items) => {
                for item in items {
                    self.collect(key, item);
                }
            }
            serde_json::Value::Object(nested) => {
                for (sub, item) in nested {
                    self.collect(&format!("{key}.{sub}"), item);
                }
            }
            serde_json::Value::Null => {}
            other => self.push(key, &other.to_string()),
        }
    }

    fn push(&mut self, key: &str, message: &str) {
        if matches!(key, "detail" | "non_field_errors" | "error" | "message") {
            self.push_general(message);
        } else {
            self.add(key, message);
        }
    }

    /// Record a message for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Record a message not tied to a field.
    pub fn push_general(&mut self, message: impl Into<String>) {
        self.general.push(message.into());
    }

    /// First message for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Whether a field has any message.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn general(&self) -> &[String] {
        &self.general
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    /// Move every message from `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
        self.general.extend(other.general);
    }

    /// Move messages recorded under the API's field name to a form's.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(messages) = self.fields.remove(from) {
            self.fields.entry(to.to_owned()).or_default().extend(messages);
        }
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when there is at least one.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.general.clone();
        for (field, messages) in &self.fields {
            for message in messages {
                parts.push(format!("{field}: {message}"));
            }
        }
        write!(f, "{}", parts.join("; "))
    }
}
