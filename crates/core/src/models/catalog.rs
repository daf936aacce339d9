//! Catalog types: products, variants, images, categories.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId, VariantId};

// =============================================================================
// Product Types
// =============================================================================

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub id: Option<i64>,
    /// Absolute image URL.
    #[serde(alias = "url")]
    pub image: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// A purchasable variant of a product (shade, size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    /// Display name, e.g. "30 ml" or "Rose Nude".
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    /// Variant price. Falls back to the product price when absent.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default = "super::default_true")]
    pub is_active: bool,
    #[serde(default = "super::default_true")]
    pub in_stock: bool,
}

/// A product as returned by `/products/products/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: Decimal,
    /// Pre-sale price, shown struck through when higher than `price`.
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "super::default_true")]
    pub is_active: bool,
    #[serde(default = "super::default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The primary image URL, or the first image when none is flagged.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
            .map(|img| img.image.as_str())
    }

    /// Look up an active variant by id.
    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id && v.is_active)
    }

    /// Active variants, in server order.
    pub fn active_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|v| v.is_active)
    }

    /// Price for a specific variant, or the product price.
    #[must_use]
    pub fn price_for(&self, variant: Option<&Variant>) -> Decimal {
        variant.and_then(|v| v.price).unwrap_or(self.price)
    }

    /// Whether a compare-at price above the selling price is set.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price.is_some_and(|compare| compare > self.price)
    }
}

/// Payload for creating or updating a product from the back-office.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductWrite {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub category: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
}

// =============================================================================
// Category Types
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub parent: Option<CategoryId>,
    #[serde(default = "super::default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub product_count: Option<u64>,
}

/// Payload for creating or updating a category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryWrite {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent: Option<CategoryId>,
    pub is_active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn serum() -> Product {
        serde_json::from_value(json!({
            "id": 12,
            "name": "Vitamin C Serum",
            "slug": "vitamin-c-serum",
            "price": "2400.00",
            "compare_at_price": "2800.00",
            "images": [
                {"image": "https://cdn.example.com/a.jpg"},
                {"image": "https://cdn.example.com/b.jpg", "is_primary": true}
            ],
            "variants": [
                {"id": 7, "name": "30 ml"},
                {"id": 8, "name": "50 ml", "price": "3600.00"},
                {"id": 9, "name": "Travel", "is_active": false}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_minimal_product_defaults() {
        let product = serum();
        assert!(product.is_active);
        assert!(product.in_stock);
        assert!(!product.is_featured);
        assert_eq!(product.description, "");
        assert_eq!(product.category, None);
    }

    #[test]
    fn test_primary_image_prefers_flagged() {
        assert_eq!(
            serum().primary_image(),
            Some("https://cdn.example.com/b.jpg")
        );
    }

    #[test]
    fn test_variant_price_fallback() {
        let product = serum();
        let small = product.variant(VariantId::new(7));
        let large = product.variant(VariantId::new(8));
        assert_eq!(product.price_for(small).to_string(), "2400.00");
        assert_eq!(product.price_for(large).to_string(), "3600.00");
        assert!(product.variant(VariantId::new(9)).is_none());
        assert_eq!(product.active_variants().count(), 2);
    }

    #[test]
    fn test_is_on_sale() {
        let mut product = serum();
        assert!(product.is_on_sale());
        product.compare_at_price = Some(product.price);
        assert!(!product.is_on_sale());
    }
}
