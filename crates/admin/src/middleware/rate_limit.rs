//! Rate limiting for the staff login form using governor.
//!
//! The back-office sits behind a private network, so the client IP comes
//! from `SmartIpKeyExtractor` (forwarding headers, then the peer address;
//! requires serving with connect info).

use std::sync::Arc;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Login attempts: ~5 per minute per IP, bursts of 3.
///
/// # Panics
///
/// Does not panic: the builder only rejects zero periods or burst sizes.
#[must_use]
pub fn login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(12) // Replenish 1 token every 12 seconds
        .burst_size(3)
        .finish()
        .expect("rate limiter config with per_second(12) and burst_size(3) is valid");
    GovernorLayer::new(Arc::new(config))
}
