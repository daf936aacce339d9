//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. CSP (per-request nonce and policy)
//! 6. Session layer (tower-sessions with `PostgreSQL` store)
//! 7. Sign-in redirect (rewrites `LoginRequired` responses)
//! 8. Rate limiting on auth and checkout routes (governor)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    LoginRequired, OptionalAuth, RequireAuth, login_redirect_middleware, login_required, login_url,
    safe_next, set_current_user,
};
pub use csp::{CspNonce, csp_middleware};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SessionTokenStore, create_session_layer, load_cart, save_cart};
