//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (stricter CSP than the storefront)
//! 5. Session layer (tower-sessions with `PostgreSQL` store, admin schema)
//! 6. Rate limiting on the login form (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalStaff, RequireStaff, StaffAuthRejection, set_current_staff, set_flash, take_flash,
};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SessionTokenStore, create_session_layer};
