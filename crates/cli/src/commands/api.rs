//! Commerce API checks.

use super::{CliError, api_client};

/// Check the API answers without a server error.
///
/// # Errors
///
/// Returns an error if `GLOWHAUS_API_URL` is unset or the API is down.
pub async fn ping() -> Result<(), CliError> {
    let client = api_client()?;
    tracing::info!(api = client.base_url(), "Pinging commerce API...");
    client.ping().await?;
    tracing::info!("Commerce API is up");
    Ok(())
}
