//! Content Security Policy with a per-request nonce.
//!
//! The nonce goes on the `<script>` tags in `base.html`; the policy allows
//! only those scripts, same-origin requests, and images from any HTTPS
//! host (product photos live on the API's media storage).

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, header::CONTENT_SECURITY_POLICY, request::Parts},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// A CSP nonce value for script tags.
///
/// Each request gets a unique, cryptographically random nonce (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The policy for a page rendered with this nonce.
    #[must_use]
    pub fn policy(&self) -> String {
        format!(
            "default-src 'none'; \
             script-src 'self' 'nonce-{}'; \
             style-src 'self'; \
             font-src 'self'; \
             img-src 'self' https: data:; \
             connect-src 'self'; \
             frame-src 'none'; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self' https:; \
             frame-ancestors 'none'",
            self.0
        )
    }
}

/// Generate a nonce, expose it to handlers, and set the matching
/// `Content-Security-Policy` header on the response.
///
/// `form-action` allows HTTPS targets because card payments redirect to
/// the payment provider's hosted page.
pub async fn csp_middleware(mut request: Request, next: Next) -> Response {
    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&nonce.policy()) {
        response.headers_mut().insert(CONTENT_SECURITY_POLICY, value);
    }
    response
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce not found in request extensions - middleware may be misconfigured");
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }

    #[test]
    fn test_policy_embeds_nonce() {
        let nonce = CspNonce("abc123".to_string());
        let policy = nonce.policy();
        assert!(policy.contains("script-src 'self' 'nonce-abc123'"));
        assert!(policy.contains("frame-ancestors 'none'"));
        assert!(HeaderValue::from_str(&policy).is_ok());
    }
}
