//! Payment status polling policy.
//!
//! After a payment is started the shopper waits on a page that asks the
//! backend for the payment status every few seconds. Polling stops as soon
//! as the status is terminal, or once the timeout has elapsed.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::PaymentStatus;

/// How often and for how long to poll a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum number of status checks that fit in the timeout.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        let attempts = self.timeout.as_millis() / self.interval.as_millis();
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// What to do after a status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Terminal status reached.
    Finished(PaymentStatus),
    /// Still not terminal and the timeout has elapsed.
    TimedOut,
    /// Keep polling.
    Continue,
}

impl PollDecision {
    /// Decide based on the latest status and when polling started.
    ///
    /// A terminal status wins over the timeout, so a payment confirmed on
    /// the last check is still reported as finished.
    #[must_use]
    pub fn evaluate(
        policy: &PollPolicy,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
        status: Option<PaymentStatus>,
    ) -> Self {
        let elapsed = (now - started_at).to_std().unwrap_or(Duration::ZERO);
        Self::after(policy, elapsed, status)
    }

    /// Same decision from an elapsed duration, for monotonic clocks.
    #[must_use]
    pub fn after(policy: &PollPolicy, elapsed: Duration, status: Option<PaymentStatus>) -> Self {
        if let Some(status) = status.filter(|s| s.is_terminal()) {
            return Self::Finished(status);
        }
        if elapsed >= policy.timeout {
            Self::TimedOut
        } else {
            Self::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn start() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(20_000)
    }

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.timeout, Duration::from_secs(90));
        assert_eq!(policy.max_attempts(), 30);
    }

    #[test]
    fn test_continue_while_pending() {
        let policy = PollPolicy::default();
        let now = start() + TimeDelta::seconds(30);
        assert_eq!(
            PollDecision::evaluate(&policy, start(), now, Some(PaymentStatus::Pending)),
            PollDecision::Continue
        );
        assert_eq!(
            PollDecision::evaluate(&policy, start(), now, None),
            PollDecision::Continue
        );
    }

    #[test]
    fn test_terminal_status_finishes() {
        let policy = PollPolicy::default();
        let now = start() + TimeDelta::seconds(6);
        let decision = PollDecision::evaluate(&policy, start(), now, Some(PaymentStatus::Failed));
        assert_eq!(decision, PollDecision::Finished(PaymentStatus::Failed));
    }

    #[test]
    fn test_times_out_at_ninety_seconds() {
        let policy = PollPolicy::default();
        let just_before = start() + TimeDelta::seconds(89);
        let at_timeout = start() + TimeDelta::seconds(90);
        assert_eq!(
            PollDecision::evaluate(&policy, start(), just_before, Some(PaymentStatus::Processing)),
            PollDecision::Continue
        );
        assert_eq!(
            PollDecision::evaluate(&policy, start(), at_timeout, Some(PaymentStatus::Processing)),
            PollDecision::TimedOut
        );
    }

    #[test]
    fn test_success_on_last_check_beats_timeout() {
        let policy = PollPolicy::default();
        let late = start() + TimeDelta::seconds(120);
        assert_eq!(
            PollDecision::evaluate(&policy, start(), late, Some(PaymentStatus::Success)),
            PollDecision::Finished(PaymentStatus::Success)
        );
    }

    #[test]
    fn test_clock_skew_does_not_time_out() {
        let policy = PollPolicy::default();
        let earlier = start() - TimeDelta::seconds(5);
        assert_eq!(
            PollDecision::evaluate(&policy, start(), earlier, None),
            PollDecision::Continue
        );
    }
}
