//! Status enums for orders and payments.
//!
//! The backend owns every transition; these enums only read and display
//! whatever state it reports. Unrecognized order states decode to
//! [`OrderStatus::Unknown`] so a new server-side state never breaks a page.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
    /// Any state this build does not know about.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses staff can pick from in the back-office.
    pub const SELECTABLE: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Unknown => "Unknown",
        }
    }

    /// CSS modifier for status badges.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending | Self::Unknown => "badge--muted",
            Self::Confirmed | Self::Processing => "badge--info",
            Self::Shipped => "badge--accent",
            Self::Delivered => "badge--success",
            Self::Cancelled | Self::Refunded => "badge--danger",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SELECTABLE
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment status as reported by `GET /api/payments/status/{ref}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    #[serde(alias = "completed", alias = "paid", alias = "successful")]
    Success,
    Failed,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    /// Whether polling should stop at this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Cancelled | Self::Expired
        )
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Message shown to the shopper while or after waiting.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Pending => "Waiting for you to approve the payment on your phone.",
            Self::Processing => "Your payment is being processed.",
            Self::Success => "Payment received. Thank you for your order!",
            Self::Failed => "The payment did not go through.",
            Self::Cancelled => "The payment was cancelled.",
            Self::Expired => "The payment request expired before it was approved.",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
