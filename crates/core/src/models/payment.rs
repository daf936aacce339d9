//! Payment initiation and status payloads.
//!
//! Payment processing itself happens behind the backend; the storefront only
//! starts a payment and reads its status.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, PaymentStatus};

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Mobile money push to the shopper's phone.
    #[default]
    Mpesa,
    Card,
}

impl PaymentMethod {
    pub const ALL: [Self; 2] = [Self::Mpesa, Self::Card];

    /// Wire and form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mpesa => "mpesa",
            Self::Card => "card",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mpesa => "M-Pesa",
            Self::Card => "Card",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mpesa" => Ok(Self::Mpesa),
            "card" => Ok(Self::Card),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Body of `POST /api/payments/initiate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub phone_number: String,
    pub method: PaymentMethod,
}

/// Response of `POST /api/payments/initiate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiated {
    /// Reference used to poll the payment status.
    #[serde(alias = "checkout_request_id", alias = "transaction_reference")]
    pub reference: String,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub message: Option<String>,
    /// Hosted page to redirect to for card payments.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Response of `GET /api/payments/status/{ref}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusReport {
    #[serde(default)]
    pub reference: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "order")]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}
