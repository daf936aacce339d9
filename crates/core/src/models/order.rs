//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId, VariantId};

/// Delivery details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    #[serde(alias = "address_line")]
    pub address: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// A line on a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(default)]
    pub product: Option<ProductId>,
    pub product_name: String,
    #[serde(default)]
    pub variant: Option<VariantId>,
    #[serde(default)]
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

impl OrderItem {
    /// Server line total, or price × quantity when the server omits it.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.total_price
            .unwrap_or_else(|| self.unit_price * Decimal::from(self.quantity))
    }
}

/// An order as returned by `/orders/orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
    #[serde(default)]
    pub shipping_fee: Option<Decimal>,
    #[serde(alias = "total_amount")]
    pub total: Decimal,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub customer: Option<UserId>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Order number for display, falling back to `#<id>`.
    #[must_use]
    pub fn display_number(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the shopper can still pay for this order.
    #[must_use]
    pub fn awaiting_payment(&self) -> bool {
        self.status == OrderStatus::Pending
            && !self.payment_status.is_some_and(PaymentStatus::is_success)
    }
}

/// A line on an order being placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantId>,
    pub quantity: u32,
}

/// Body of `POST /orders/orders/`.
///
/// Only ids and quantities are sent; the backend prices the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewOrder {
    /// Build an order request from the session cart.
    #[must_use]
    pub fn from_cart(cart: &Cart, shipping_address: ShippingAddress, notes: Option<String>) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| NewOrderItem {
                product: line.product_id,
                variant: line.variant_id,
                quantity: line.quantity,
            })
            .collect();
        Self {
            items,
            shipping_address,
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// Body of the staff `PATCH /orders/orders/{id}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_order_decodes_with_aliases() {
        let order: Order = serde_json::from_value(json!({
            "id": 31,
            "status": "processing",
            "total_amount": "4800.00",
            "items": [
                {"product_name": "Lip Oil", "quantity": 2, "unit_price": "1200.00"},
                {"product_name": "Toner", "quantity": 1, "unit_price": "2400.00", "total_price": "2400.00"}
            ]
        }))
        .unwrap();

        assert_eq!(order.display_number(), "#31");
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.items.first().unwrap().line_total().to_string(), "2400.00");
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn test_awaiting_payment() {
        let mut order: Order =
            serde_json::from_value(json!({"id": 1, "total": "10.00"})).unwrap();
        assert!(order.awaiting_payment());
        order.payment_status = Some(PaymentStatus::Success);
        assert!(!order.awaiting_payment());
    }

    #[test]
    fn test_new_order_from_cart_sends_ids_only() {
        let mut cart = Cart::default();
        cart.add(CartLine {
            product_id: ProductId::new(12),
            variant_id: Some(VariantId::new(7)),
            slug: "serum".to_owned(),
            name: "Serum".to_owned(),
            variant_label: Some("30 ml".to_owned()),
            unit_price: Decimal::from_str("2400").unwrap(),
            quantity: 2,
            image_url: None,
        });

        let order = NewOrder::from_cart(&cart, ShippingAddress::default(), Some("  ".to_owned()));
        let body = serde_json::to_value(&order).unwrap();
        assert_eq!(body["items"], json!([{"product": 12, "variant": 7, "quantity": 2}]));
        assert!(body.get("notes").is_none());
    }
}
