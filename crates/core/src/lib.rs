//! Glowhaus Core - Shared types library.
//!
//! This crate provides common types used across all Glowhaus components:
//! - `api` - REST client for the commerce backend
//! - `storefront` - Public-facing e-commerce site
//! - `admin` - Staff back-office
//! - `cli` - Command-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure state - no I/O, no database
//! access, no HTTP clients. The backend API owns every entity; the shapes
//! here mirror its JSON and carry no invariants beyond field defaults.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`models`] - Entity shapes mirrored from the REST API
//! - [`cart`] - Session cart state with merge-by-id and derived totals
//! - [`payment`] - Payment status polling policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod models;
pub mod payment;
pub mod types;

pub use cart::{Cart, CartError, CartLine, CartLineKey, CartTotals, ShippingRates};
pub use payment::{PollDecision, PollPolicy};
pub use types::*;
