//! Command implementations.

pub mod api;
pub mod migrate;
pub mod payment;

use glowhaus_api::{ApiClient, ApiConfig, ApiError};
use glowhaus_core::PaymentStatus;
use secrecy::SecretString;
use url::Url;

/// Errors a command can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Payment {reference} ended as {status}")]
    PaymentUnsettled {
        reference: String,
        status: PaymentStatus,
    },

    #[error("Payment {0} did not settle in time")]
    PaymentTimedOut(String),
}

/// Read the first of `names` that is set.
fn first_env(names: &[&'static str]) -> Result<SecretString, CliError> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .map(SecretString::from)
        .ok_or_else(|| CliError::MissingEnvVar(names.first().copied().unwrap_or("DATABASE_URL")))
}

/// Build an API client from `GLOWHAUS_API_URL`.
fn api_client() -> Result<ApiClient, CliError> {
    let raw = std::env::var("GLOWHAUS_API_URL").map_err(|_| CliError::MissingEnvVar("GLOWHAUS_API_URL"))?;
    let base_url = Url::parse(&raw).map_err(|e| CliError::InvalidValue("GLOWHAUS_API_URL", e.to_string()))?;
    Ok(ApiClient::new(&ApiConfig::new(base_url))?)
}
