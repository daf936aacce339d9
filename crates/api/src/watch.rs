//! Payment status watcher.
//!
//! Polls a payment until it reaches a terminal status or the policy's
//! timeout elapses. Dropping the returned future stops polling.

use std::future::Future;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, instrument, warn};

use glowhaus_core::models::PaymentStatusReport;
use glowhaus_core::{PaymentStatus, PollDecision, PollPolicy};

use crate::auth::TokenStore;
use crate::client::ApiClient;
use crate::ApiError;

/// Something that can report a payment's status.
pub trait PaymentStatusSource: Send + Sync {
    fn payment_status(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<PaymentStatusReport, ApiError>> + Send;
}

/// Reads payment status through the API as a signed-in visitor.
pub struct AuthedPaymentSource<'a, S> {
    pub client: &'a ApiClient,
    pub store: &'a S,
}

impl<S: TokenStore> PaymentStatusSource for AuthedPaymentSource<'_, S> {
    async fn payment_status(&self, reference: &str) -> Result<PaymentStatusReport, ApiError> {
        self.client.payment_status(self.store, reference).await
    }
}

/// How watching ended.
#[derive(Debug)]
pub enum WatchOutcome {
    /// The payment reached a terminal status.
    Finished(PaymentStatusReport),
    /// The timeout elapsed first.
    TimedOut {
        /// Last status seen, if any check succeeded.
        last_status: Option<PaymentStatus>,
    },
    /// A status check failed in a way retrying cannot fix: the session is
    /// gone, or the API refused or does not know the payment.
    Failed(ApiError),
}

/// Poll `source` every `policy.interval` until a terminal status or until
/// `policy.timeout` has elapsed.
///
/// The first check happens immediately. Transient failures (network,
/// 5xx, rate limits) are logged and polling continues; errors that need a
/// new login or that the API rejects outright end the watch.
#[instrument(skip(source, policy))]
pub async fn watch_payment<P: PaymentStatusSource>(
    source: &P,
    reference: &str,
    policy: PollPolicy,
) -> WatchOutcome {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_status = None;

    loop {
        ticker.tick().await;

        match source.payment_status(reference).await {
            Ok(report) if report.status.is_terminal() => {
                debug!(status = %report.status, "Payment reached terminal status");
                return WatchOutcome::Finished(report);
            }
            Ok(report) => {
                debug!(status = %report.status, "Payment still in progress");
                last_status = Some(report.status);
            }
            Err(e) if e.needs_login() || e.is_rejection() => {
                warn!(error = %e, "Payment status check failed, giving up");
                return WatchOutcome::Failed(e);
            }
            Err(e) => warn!(error = %e, "Payment status check failed"),
        }

        if PollDecision::after(&policy, started.elapsed(), last_status) == PollDecision::TimedOut {
            return WatchOutcome::TimedOut { last_status };
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Replays scripted results, then repeats `fallback`.
    struct Scripted {
        script: Mutex<VecDeque<Option<PaymentStatus>>>,
        fallback: PaymentStatus,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Option<PaymentStatus>>, fallback: PaymentStatus) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PaymentStatusSource for Scripted {
        async fn payment_status(&self, reference: &str) -> Result<PaymentStatusReport, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next.unwrap_or(Some(self.fallback)) {
                Some(status) => Ok(PaymentStatusReport {
                    reference: reference.to_owned(),
                    status,
                    message: None,
                    order_id: None,
                    amount: None,
                }),
                None => Err(ApiError::Upstream {
                    status: 503,
                    body: String::new(),
                }),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_finishes_on_terminal_status() {
        let source = Scripted::new(
            vec![
                Some(PaymentStatus::Pending),
                None,
                Some(PaymentStatus::Processing),
                Some(PaymentStatus::Success),
            ],
            PaymentStatus::Pending,
        );
        let started = Instant::now();

        let outcome = watch_payment(&source, "ref-1", PollPolicy::default()).await;

        match outcome {
            WatchOutcome::Finished(report) => {
                assert_eq!(report.status, PaymentStatus::Success);
                assert_eq!(report.reference, "ref-1");
            }
            other => panic!("expected a terminal status, got {other:?}"),
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_ninety_seconds() {
        let source = Scripted::new(vec![], PaymentStatus::Pending);
        let started = Instant::now();

        let outcome = watch_payment(&source, "ref-2", PollPolicy::default()).await;

        assert!(matches!(
            outcome,
            WatchOutcome::TimedOut {
                last_status: Some(PaymentStatus::Pending)
            }
        ));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(90));
        assert!(elapsed < Duration::from_secs(93));
        let calls = source.calls.load(Ordering::SeqCst);
        assert!((30..=31).contains(&calls));
    }

    /// Always fails with the error `make` builds.
    struct Failing {
        make: fn() -> ApiError,
        calls: AtomicUsize,
    }

    impl PaymentStatusSource for Failing {
        async fn payment_status(&self, _reference: &str) -> Result<PaymentStatusReport, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.make)())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_ends_watch_at_once() {
        let source = Failing {
            make: || ApiError::SessionExpired,
            calls: AtomicUsize::new(0),
        };
        let started = Instant::now();

        let outcome = watch_payment(&source, "ref-4", PollPolicy::default()).await;

        assert!(matches!(outcome, WatchOutcome::Failed(ApiError::SessionExpired)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_payment_ends_watch() {
        let source = Failing {
            make: || ApiError::NotFound,
            calls: AtomicUsize::new(0),
        };

        let outcome = watch_payment(&source, "ref-5", PollPolicy::default()).await;

        assert!(matches!(outcome, WatchOutcome::Failed(ApiError::NotFound)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limits_keep_polling() {
        let source = Failing {
            make: || ApiError::RateLimited(1),
            calls: AtomicUsize::new(0),
        };

        let outcome = watch_payment(&source, "ref-6", PollPolicy::default()).await;

        assert!(matches!(outcome, WatchOutcome::TimedOut { last_status: None }));
        assert!(source.calls.load(Ordering::SeqCst) >= 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_future_stops_polling() {
        let source = Scripted::new(vec![], PaymentStatus::Processing);

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            watch_payment(&source, "ref-3", PollPolicy::default()),
        )
        .await;
        assert!(result.is_err());

        let calls = source.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }
}
