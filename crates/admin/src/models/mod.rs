//! Admin-local models.
//!
//! Entity shapes come from `glowhaus_core::models`; this module holds
//! what the back-office keeps in a staff member's session.

pub mod session;

pub use session::{CurrentStaff, keys as session_keys};
