//! Payment inspection.

use std::time::Duration;

use glowhaus_api::{AuthedPaymentSource, MemoryTokenStore, WatchOutcome, watch_payment};
use glowhaus_core::PollPolicy;
use secrecy::SecretString;

use super::{CliError, api_client};

/// Build a polling policy from whole seconds.
///
/// # Errors
///
/// Returns an error if the interval is zero or longer than the timeout.
pub fn policy(interval_secs: u64, timeout_secs: u64) -> Result<PollPolicy, CliError> {
    if interval_secs == 0 {
        return Err(CliError::InvalidValue("--interval", "must be at least 1".to_string()));
    }
    if interval_secs > timeout_secs {
        return Err(CliError::InvalidValue(
            "--timeout",
            "must not be shorter than the interval".to_string(),
        ));
    }
    Ok(PollPolicy {
        interval: Duration::from_secs(interval_secs),
        timeout: Duration::from_secs(timeout_secs),
    })
}

/// Sign in as the payment's owner and poll until the payment settles.
///
/// # Errors
///
/// Returns an error if sign-in fails, if the API refuses the status
/// checks, or if the payment fails, is cancelled, expires, or does not
/// settle within the policy's timeout.
pub async fn watch(
    reference: &str,
    email: &str,
    password: SecretString,
    policy: PollPolicy,
) -> Result<(), CliError> {
    let client = api_client()?;
    let auth = client.login(email, &password).await?;
    let store = MemoryTokenStore::with_tokens(auth.tokens);

    tracing::info!(reference, max_checks = policy.max_attempts(), "Watching payment...");
    let source = AuthedPaymentSource {
        client: &client,
        store: &store,
    };
    let outcome = watch_payment(&source, reference, policy).await;

    client.logout(&store).await;

    match outcome {
        WatchOutcome::Finished(report) if report.status.is_success() => {
            tracing::info!(
                reference = %report.reference,
                order_id = ?report.order_id,
                amount = ?report.amount,
                "Payment succeeded"
            );
            Ok(())
        }
        WatchOutcome::Finished(report) => {
            if let Some(message) = &report.message {
                tracing::warn!(message = %message, "Payment provider message");
            }
            Err(CliError::PaymentUnsettled {
                reference: report.reference,
                status: report.status,
            })
        }
        WatchOutcome::Failed(e) => Err(CliError::Api(e)),
        WatchOutcome::TimedOut { last_status } => {
            tracing::warn!(last_status = ?last_status, "Gave up waiting for payment");
            Err(CliError::PaymentTimedOut(reference.to_owned()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_seconds() {
        let policy = policy(5, 60).unwrap();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.timeout, Duration::from_secs(60));
        assert_eq!(policy.max_attempts(), 12);
    }

    #[test]
    fn test_policy_rejects_bad_values() {
        assert!(matches!(policy(0, 60), Err(CliError::InvalidValue("--interval", _))));
        assert!(matches!(policy(30, 10), Err(CliError::InvalidValue("--timeout", _))));
    }
}
