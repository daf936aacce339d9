//! Session cart.
//!
//! The cart lives in the visitor's session until checkout, when only product
//! ids, variant ids and quantities are sent to the backend. Totals computed
//! here are estimates for display; the backend prices the order.
//!
//! Lines are identified by `(product_id, variant_id)`. Adding a product that
//! is already in the cart increases the existing line's quantity instead of
//! appending a duplicate line.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{ProductId, VariantId};

/// Upper bound for the quantity of a single line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("item {0} is not in the cart")]
    LineNotFound(CartLineKey),
    #[error("invalid cart line key: {0}")]
    InvalidKey(String),
}

// =============================================================================
// Line Key
// =============================================================================

/// Identity of a cart line.
///
/// Renders as `"12"` for a product without variants and `"12:7"` for
/// product 12, variant 7. That string is what cart forms post back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartLineKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl CartLineKey {
    #[must_use]
    pub const fn new(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }
}

impl fmt::Display for CartLineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_id {
            Some(variant) => write!(f, "{}:{variant}", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

impl FromStr for CartLineKey {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CartError::InvalidKey(s.to_owned());
        let (product, variant) = match s.split_once(':') {
            Some((product, variant)) => (product, Some(variant)),
            None => (s, None),
        };
        let product_id = product.parse::<ProductId>().map_err(|_| invalid())?;
        let variant_id = variant
            .map(|v| v.parse::<VariantId>().map_err(|_| invalid()))
            .transpose()?;
        Ok(Self::new(product_id, variant_id))
    }
}

impl Serialize for CartLineKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CartLineKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Lines
// =============================================================================

/// One product (or product variant) in the cart.
///
/// Name, price and image are snapshots taken when the line was added so the
/// cart renders without calling the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub variant_label: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartLine {
    #[must_use]
    pub const fn key(&self) -> CartLineKey {
        CartLineKey::new(self.product_id, self.variant_id)
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

const fn clamp_quantity(quantity: u32) -> u32 {
    if quantity == 0 {
        1
    } else if quantity > MAX_LINE_QUANTITY {
        MAX_LINE_QUANTITY
    } else {
        quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add a line, merging with an existing line for the same product and
    /// variant. Returns the key of the affected line.
    pub fn add(&mut self, mut line: CartLine) -> CartLineKey {
        let key = line.key();
        line.quantity = clamp_quantity(line.quantity);

        if let Some(existing) = self.lines.iter_mut().find(|l| l.key() == key) {
            existing.quantity = clamp_quantity(existing.quantity.saturating_add(line.quantity));
            existing.unit_price = line.unit_price;
        } else {
            self.lines.push(line);
        }
        key
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has this key.
    pub fn set_quantity(&mut self, key: CartLineKey, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(key).map(|_| ());
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.key() == key)
            .ok_or(CartError::LineNotFound(key))?;
        line.quantity = clamp_quantity(quantity);
        Ok(())
    }

    /// Remove a line and return it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has this key.
    pub fn remove(&mut self, key: CartLineKey) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|l| l.key() == key)
            .ok_or(CartError::LineNotFound(key))?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, key: CartLineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.key() == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Delivery pricing taken from the site settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShippingRates {
    pub flat_fee: Decimal,
    /// Subtotal at or above which delivery is free.
    pub free_threshold: Option<Decimal>,
}

impl ShippingRates {
    /// Delivery fee for a subtotal. Empty carts ship free.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match self.free_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.flat_fee,
        }
    }
}

/// Derived cart totals for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    /// How much more the shopper needs to spend for free delivery.
    pub free_shipping_remaining: Option<Decimal>,
}

impl CartTotals {
    #[must_use]
    pub fn compute(cart: &Cart, rates: &ShippingRates) -> Self {
        let subtotal = cart.subtotal();
        let shipping = rates.fee_for(subtotal);
        let free_shipping_remaining = rates
            .free_threshold
            .filter(|threshold| subtotal > Decimal::ZERO && subtotal < *threshold)
            .map(|threshold| threshold - subtotal);

        Self {
            item_count: cart.item_count(),
            subtotal,
            shipping,
            total: subtotal + shipping,
            free_shipping_remaining,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(product: i64, variant: Option<i64>, price: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            variant_id: variant.map(VariantId::new),
            slug: format!("product-{product}"),
            name: format!("Product {product}"),
            variant_label: None,
            unit_price: dec(price),
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn test_add_merges_same_product_and_variant() {
        let mut cart = Cart::default();
        cart.add(line(1, Some(10), "500.00", 2));
        cart.add(line(1, Some(10), "500.00", 1));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_keeps_variants_separate() {
        let mut cart = Cart::default();
        cart.add(line(1, Some(10), "500.00", 1));
        cart.add(line(1, Some(11), "650.00", 1));
        cart.add(line(1, None, "450.00", 1));

        assert_eq!(cart.lines().len(), 3);
        assert_eq!(cart.subtotal(), dec("1600.00"));
    }

    #[test]
    fn test_add_clamps_quantity() {
        let mut cart = Cart::default();
        let key = cart.add(line(1, None, "10", 0));
        assert_eq!(cart.get(key).unwrap().quantity, 1);

        cart.add(line(1, None, "10", 150));
        assert_eq!(cart.get(key).unwrap().quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_add_refreshes_unit_price() {
        let mut cart = Cart::default();
        let key = cart.add(line(2, None, "1000.00", 1));
        cart.add(line(2, None, "900.00", 1));
        assert_eq!(cart.get(key).unwrap().unit_price, dec("900.00"));
        assert_eq!(cart.subtotal(), dec("1800.00"));
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        let key = cart.add(line(3, None, "250", 4));
        cart.set_quantity(key, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut cart = Cart::default();
        let key = CartLineKey::new(ProductId::new(9), None);
        assert_eq!(cart.set_quantity(key, 2), Err(CartError::LineNotFound(key)));
        assert_eq!(cart.remove(key), Err(CartError::LineNotFound(key)));
    }

    #[test]
    fn test_line_key_string_form() {
        let plain = CartLineKey::new(ProductId::new(12), None);
        let variant = CartLineKey::new(ProductId::new(12), Some(VariantId::new(7)));
        assert_eq!(plain.to_string(), "12");
        assert_eq!(variant.to_string(), "12:7");
        assert_eq!("12:7".parse::<CartLineKey>().unwrap(), variant);
        assert_eq!("12".parse::<CartLineKey>().unwrap(), plain);
        assert!("12:".parse::<CartLineKey>().is_err());
        assert!("abc".parse::<CartLineKey>().is_err());
    }

    #[test]
    fn test_totals_with_flat_fee() {
        let mut cart = Cart::default();
        cart.add(line(1, None, "1250.50", 2));
        let rates = ShippingRates {
            flat_fee: dec("300"),
            free_threshold: Some(dec("5000")),
        };

        let totals = CartTotals::compute(&cart, &rates);
        assert_eq!(totals.subtotal, dec("2501.00"));
        assert_eq!(totals.shipping, dec("300"));
        assert_eq!(totals.total, dec("2801.00"));
        assert_eq!(totals.free_shipping_remaining, Some(dec("2499.00")));
    }

    #[test]
    fn test_totals_free_shipping_at_threshold() {
        let mut cart = Cart::default();
        cart.add(line(1, None, "2500", 2));
        let rates = ShippingRates {
            flat_fee: dec("300"),
            free_threshold: Some(dec("5000")),
        };

        let totals = CartTotals::compute(&cart, &rates);
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dec("5000"));
        assert_eq!(totals.free_shipping_remaining, None);
    }

    #[test]
    fn test_totals_empty_cart() {
        let rates = ShippingRates {
            flat_fee: dec("300"),
            free_threshold: None,
        };
        let totals = CartTotals::compute(&Cart::default(), &rates);
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_cart_survives_session_serialization() {
        let mut cart = Cart::default();
        cart.add(line(5, Some(2), "99.99", 3));
        let json = serde_json::to_value(&cart).unwrap();
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
