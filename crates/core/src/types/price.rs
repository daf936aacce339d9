//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts come from the backend as decimal strings (`"1250.00"`) and are
//! never converted to floating point.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (shillings, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Format for display, e.g. `KSh 1,250.00` or `$12.50`.
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let plain = format!("{:.2}", rounded.abs());
        let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
        write!(
            f,
            "{sign}{}{}.{cents}",
            self.currency_code.symbol(),
            group_thousands(whole)
        )
    }
}

/// Insert `,` separators every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// ISO 4217 currency codes the store can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    /// Kenyan shilling.
    #[default]
    KES,
    /// Ugandan shilling.
    UGX,
    /// Tanzanian shilling.
    TZS,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display prefix, including a trailing space for letter symbols.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::KES => "KSh ",
            Self::UGX => "USh ",
            Self::TZS => "TSh ",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// The three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::KES => "KES",
            Self::UGX => "UGX",
            Self::TZS => "TZS",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KES" => Ok(Self::KES),
            "UGX" => Ok(Self::UGX),
            "TZS" => Ok(Self::TZS),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_display_groups_thousands() {
        let price = Price::new(dec("1250"), CurrencyCode::KES);
        assert_eq!(price.display(), "KSh 1,250.00");

        let big = Price::new(dec("1234567.5"), CurrencyCode::KES);
        assert_eq!(big.display(), "KSh 1,234,567.50");
    }

    #[test]
    fn test_display_small_and_symbol_currencies() {
        assert_eq!(Price::new(dec("12.5"), CurrencyCode::USD).display(), "$12.50");
        assert_eq!(Price::new(dec("999.999"), CurrencyCode::GBP).display(), "£1,000.00");
        assert_eq!(Price::zero(CurrencyCode::EUR).display(), "€0.00");
    }

    #[test]
    fn test_display_negative_amount() {
        let refund = Price::new(dec("-1500"), CurrencyCode::KES);
        assert_eq!(refund.display(), "-KSh 1,500.00");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(CurrencyCode::from_str(" kes ").unwrap(), CurrencyCode::KES);
        assert_eq!(CurrencyCode::from_str("USD").unwrap(), CurrencyCode::USD);
        assert!(CurrencyCode::from_str("XYZ").is_err());
    }

    #[test]
    fn test_currency_serde_uppercase() {
        let json = serde_json::to_string(&CurrencyCode::TZS).unwrap();
        assert_eq!(json, "\"TZS\"");
    }
}
