//! Storefront-local models.
//!
//! Entity shapes come from `glowhaus_core::models`; this module only
//! holds what the storefront keeps in the visitor's session.

pub mod session;

pub use session::{CurrentUser, PaymentWatch, keys as session_keys};
