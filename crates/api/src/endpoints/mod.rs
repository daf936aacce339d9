//! Typed endpoint groups.
//!
//! Each module adds an `impl ApiClient` block for one area of the API.
//! Public catalog reads are cached; everything that needs a signed-in
//! visitor takes a [`TokenStore`](crate::TokenStore).

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod content;
pub mod orders;
pub mod payments;
pub mod settings;

pub use admin::CustomerQuery;
pub use auth::{AuthSession, Registration};
pub use catalog::ProductQuery;
pub use orders::OrderQuery;

use crate::ApiError;

/// Validate a slug or reference before putting it in a path.
///
/// Anything outside `[A-Za-z0-9_-]` cannot name a resource, so it is
/// reported as not found without a request.
pub(crate) fn segment(value: &str) -> Result<&str, ApiError> {
    let valid = !value.is_empty()
        && value.len() <= 200
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(value) } else { Err(ApiError::NotFound) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_validation() {
        assert!(segment("vitamin-c-serum").is_ok());
        assert!(segment("ws_CO_191020261200").is_ok());
        assert!(segment("").is_err());
        assert!(segment("../settings").is_err());
        assert!(segment("a/b").is_err());
        assert!(segment("a b").is_err());
    }
}
