//! Store-wide settings managed from the back-office.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::ShippingRates;

/// Site settings from `GET /settings/`.
///
/// The same shape is sent back on `PATCH /settings/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub store_name: Option<String>,
    pub tagline: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    /// Flat delivery fee.
    pub shipping_fee: Decimal,
    /// Orders at or above this subtotal ship free.
    pub free_shipping_threshold: Option<Decimal>,
    /// Text for the strip above the header.
    pub announcement: Option<String>,
    pub instagram_url: Option<String>,
    pub tiktok_url: Option<String>,
}

impl SiteSettings {
    /// Shipping rates used for cart and checkout estimates.
    #[must_use]
    pub const fn shipping_rates(&self) -> ShippingRates {
        ShippingRates {
            flat_fee: self.shipping_fee,
            free_threshold: self.free_shipping_threshold,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_settings_decode() {
        let settings: SiteSettings = serde_json::from_value(json!({
            "store_name": "Glowhaus",
            "shipping_fee": "350.00",
            "free_shipping_threshold": "5000.00"
        }))
        .unwrap();

        let rates = settings.shipping_rates();
        assert_eq!(rates.flat_fee.to_string(), "350.00");
        assert_eq!(rates.free_threshold.unwrap().to_string(), "5000.00");
        assert_eq!(settings.announcement, None);
    }
}
