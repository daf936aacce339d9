//! Back-office form payloads and their validation.
//!
//! Each form keeps the raw strings it was submitted with so it can be
//! re-rendered as typed, and converts to the API's write payload once
//! valid. Messages go into [`FieldErrors`] keyed by input name, the same
//! type the API's 400 responses decode into.

use std::str::FromStr;

use glowhaus_api::FieldErrors;
use glowhaus_core::models::{
    Banner, BannerWrite, Category, CategoryWrite, JournalEntry, JournalWrite, Product,
    ProductWrite, SiteSettings,
};
use glowhaus_core::{CategoryId, Email, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

const MAX_SLUG_LEN: usize = 200;

/// HTML checkboxes are only submitted when ticked.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.is_some())
}

/// Trim an optional text field; blank becomes `None`.
fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn required(errors: &mut FieldErrors, field: &str, value: &str, message: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, message);
    }
    value.to_string()
}

/// Lowercase letters, digits and hyphens.
fn check_slug(errors: &mut FieldErrors, value: &str) -> Option<String> {
    let slug = optional(value)?;
    let valid = slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if !valid {
        errors.add("slug", "Use lowercase letters, numbers and hyphens only.");
    }
    Some(slug)
}

fn check_amount(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Decimal> {
    let value = optional(value)?;
    match Decimal::from_str(&value.replace(',', "")) {
        Ok(amount) if amount >= Decimal::ZERO && amount.scale() <= 2 => Some(amount),
        Ok(_) => {
            errors.add(field, "Enter a positive amount with at most two decimals.");
            None
        }
        Err(_) => {
            errors.add(field, "Enter a number.");
            None
        }
    }
}

/// `https://` links, or site-relative paths like `/categories/serums`.
fn check_link(errors: &mut FieldErrors, field: &str, value: &str, allow_path: bool) -> Option<String> {
    let link = optional(value)?;
    let is_path = allow_path && link.starts_with('/') && !link.starts_with("//");
    let is_url = url::Url::parse(&link).is_ok_and(|u| matches!(u.scheme(), "https" | "http"));
    if !is_path && !is_url {
        let message = if allow_path {
            "Enter a full URL or a path starting with /."
        } else {
            "Enter a full URL starting with https://."
        };
        errors.add(field, message);
    }
    Some(link)
}

fn parse_id<T: FromStr>(errors: &mut FieldErrors, field: &str, value: &str) -> Option<T> {
    let value = optional(value)?;
    let parsed = value.parse::<T>().ok();
    if parsed.is_none() {
        errors.add(field, "Pick one of the options.");
    }
    parsed
}

fn amount_text(amount: Option<Decimal>) -> String {
    amount.map(|a| a.to_string()).unwrap_or_default()
}

// =============================================================================
// Auth
// =============================================================================

/// Staff login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Returns the normalized email.
    ///
    /// # Errors
    ///
    /// Returns per-field messages for a malformed email or empty password.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email.into_inner()),
            Err(_) => {
                errors.add("email", "Enter a valid email address.");
                None
            }
        };
        if self.password.is_empty() {
            errors.add("password", "Enter your password.");
        }
        errors.into_result()?;
        email.ok_or_else(FieldErrors::new)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub slug: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub compare_at_price: String,
    pub short_description: String,
    pub description: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_active: bool,
    #[serde(deserialize_with = "checkbox")]
    pub is_featured: bool,
}

impl ProductForm {
    /// Blank form for a new product, active by default.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            is_active: true,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns per-field messages for missing or malformed values.
    pub fn validate(&self) -> Result<ProductWrite, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", &self.name, "Enter a product name.");
        let slug = check_slug(&mut errors, &self.slug);
        let category = parse_id::<CategoryId>(&mut errors, "category", &self.category);
        let price = check_amount(&mut errors, "price", &self.price);
        if price.is_none() && !errors.has("price") {
            errors.add("price", "Enter a price.");
        }
        let compare_at_price = check_amount(&mut errors, "compare_at_price", &self.compare_at_price);
        if let (Some(price), Some(compare)) = (price, compare_at_price)
            && compare <= price
        {
            errors.add(
                "compare_at_price",
                "The compare-at price must be higher than the price.",
            );
        }
        errors.into_result()?;

        Ok(ProductWrite {
            name,
            slug,
            description: self.description.trim().to_string(),
            short_description: optional(&self.short_description),
            price: price.unwrap_or_default(),
            compare_at_price,
            category,
            brand: optional(&self.brand),
            is_featured: self.is_featured,
            is_active: self.is_active,
        })
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            brand: product.brand.clone().unwrap_or_default(),
            category: product.category.map(|id| id.to_string()).unwrap_or_default(),
            price: product.price.to_string(),
            compare_at_price: amount_text(product.compare_at_price),
            short_description: product.short_description.clone().unwrap_or_default(),
            description: product.description.clone(),
            is_active: product.is_active,
            is_featured: product.is_featured,
        }
    }
}

/// Category create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_active: bool,
}

impl CategoryForm {
    #[must_use]
    pub fn blank() -> Self {
        Self {
            is_active: true,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns per-field messages for missing or malformed values.
    pub fn validate(&self, editing: Option<CategoryId>) -> Result<CategoryWrite, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", &self.name, "Enter a category name.");
        let slug = check_slug(&mut errors, &self.slug);
        let parent = parse_id::<CategoryId>(&mut errors, "parent", &self.parent);
        if parent.is_some() && parent == editing {
            errors.add("parent", "A category cannot be its own parent.");
        }
        errors.into_result()?;

        Ok(CategoryWrite {
            name,
            slug,
            description: optional(&self.description),
            parent,
            is_active: self.is_active,
        })
    }
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone().unwrap_or_default(),
            parent: category.parent.map(|id| id.to_string()).unwrap_or_default(),
            is_active: category.is_active,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order status change.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

impl StatusForm {
    /// # Errors
    ///
    /// Returns a message when the status is not one staff can pick.
    pub fn validate(&self) -> Result<OrderStatus, FieldErrors> {
        self.status.trim().parse::<OrderStatus>().map_err(|_| {
            let mut errors = FieldErrors::new();
            errors.add("status", "Pick a status from the list.");
            errors
        })
    }
}

// =============================================================================
// Content
// =============================================================================

/// Banner create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BannerForm {
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub link_url: String,
    pub button_text: String,
    pub position: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_active: bool,
}

impl BannerForm {
    #[must_use]
    pub fn blank() -> Self {
        Self {
            position: "0".to_string(),
            is_active: true,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns per-field messages for missing or malformed values.
    pub fn validate(&self) -> Result<BannerWrite, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = required(&mut errors, "title", &self.title, "Enter a title.");
        let image = check_link(&mut errors, "image", &self.image, false);
        let link_url = check_link(&mut errors, "link_url", &self.link_url, true);
        let position = match optional(&self.position) {
            None => 0,
            Some(raw) => raw.parse::<i32>().unwrap_or_else(|_| {
                errors.add("position", "Enter a whole number.");
                0
            }),
        };
        errors.into_result()?;

        Ok(BannerWrite {
            title,
            subtitle: optional(&self.subtitle),
            image,
            link_url,
            button_text: optional(&self.button_text),
            is_active: self.is_active,
            position,
        })
    }
}

impl From<&Banner> for BannerForm {
    fn from(banner: &Banner) -> Self {
        Self {
            title: banner.title.clone(),
            subtitle: banner.subtitle.clone().unwrap_or_default(),
            image: banner.image.clone().unwrap_or_default(),
            link_url: banner.link_url.clone().unwrap_or_default(),
            button_text: banner.button_text.clone().unwrap_or_default(),
            position: banner.position.to_string(),
            is_active: banner.is_active,
        }
    }
}

/// Journal entry create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JournalForm {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub cover_image: String,
    /// Comma-separated.
    pub tags: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_published: bool,
}

impl JournalForm {
    /// # Errors
    ///
    /// Returns per-field messages for missing or malformed values.
    pub fn validate(&self) -> Result<JournalWrite, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = required(&mut errors, "title", &self.title, "Enter a title.");
        let slug = check_slug(&mut errors, &self.slug);
        let body = required(&mut errors, "body", &self.body, "Write the entry.");
        let cover_image = check_link(&mut errors, "cover_image", &self.cover_image, false);
        errors.into_result()?;

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.split(',').filter_map(optional) {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }

        Ok(JournalWrite {
            title,
            slug,
            excerpt: optional(&self.excerpt),
            body,
            cover_image,
            tags,
            is_published: self.is_published,
        })
    }
}

impl From<&JournalEntry> for JournalForm {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            title: entry.title.clone(),
            slug: entry.slug.clone(),
            excerpt: entry.excerpt.clone().unwrap_or_default(),
            body: entry.body.clone(),
            cover_image: entry.cover_image.clone().unwrap_or_default(),
            tags: entry.tags.join(", "),
            is_published: entry.is_published,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Site settings form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub store_name: String,
    pub tagline: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub shipping_fee: String,
    pub free_shipping_threshold: String,
    pub announcement: String,
    pub instagram_url: String,
    pub tiktok_url: String,
}

impl SettingsForm {
    /// # Errors
    ///
    /// Returns per-field messages for malformed values.
    pub fn validate(&self) -> Result<SiteSettings, FieldErrors> {
        let mut errors = FieldErrors::new();
        let contact_email = optional(&self.contact_email).and_then(|raw| match Email::parse(&raw) {
            Ok(email) => Some(email.into_inner()),
            Err(_) => {
                errors.add("contact_email", "Enter a valid email address.");
                None
            }
        });
        let shipping_fee = check_amount(&mut errors, "shipping_fee", &self.shipping_fee);
        let free_shipping_threshold =
            check_amount(&mut errors, "free_shipping_threshold", &self.free_shipping_threshold);
        let instagram_url = check_link(&mut errors, "instagram_url", &self.instagram_url, false);
        let tiktok_url = check_link(&mut errors, "tiktok_url", &self.tiktok_url, false);
        errors.into_result()?;

        Ok(SiteSettings {
            store_name: optional(&self.store_name),
            tagline: optional(&self.tagline),
            contact_email,
            contact_phone: optional(&self.contact_phone),
            shipping_fee: shipping_fee.unwrap_or_default(),
            free_shipping_threshold,
            announcement: optional(&self.announcement),
            instagram_url,
            tiktok_url,
        })
    }
}

impl From<&SiteSettings> for SettingsForm {
    fn from(settings: &SiteSettings) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            store_name: text(&settings.store_name),
            tagline: text(&settings.tagline),
            contact_email: text(&settings.contact_email),
            contact_phone: text(&settings.contact_phone),
            shipping_fee: settings.shipping_fee.to_string(),
            free_shipping_threshold: amount_text(settings.free_shipping_threshold),
            announcement: text(&settings.announcement),
            instagram_url: text(&settings.instagram_url),
            tiktok_url: text(&settings.tiktok_url),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_form() -> ProductForm {
        ProductForm {
            name: "Vitamin C Serum".to_string(),
            price: "2,450.00".to_string(),
            category: "3".to_string(),
            ..ProductForm::blank()
        }
    }

    #[test]
    fn test_checkbox_presence_means_checked() {
        let form: CategoryForm = decode_form("name=Serums&is_active=on");
        assert!(form.is_active);
        let form: CategoryForm = decode_form("name=Serums");
        assert!(!form.is_active);
    }

    /// Flat string map, as `axum::Form` hands it to serde.
    fn decode_form<T: serde::de::DeserializeOwned>(body: &str) -> T {
        let map: serde_json::Map<String, serde_json::Value> = body
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_product_form_valid() {
        let write = product_form().validate().unwrap();
        assert_eq!(write.price, Decimal::new(245_000, 2));
        assert_eq!(write.category, Some(CategoryId::new(3)));
        assert_eq!(write.slug, None);
        assert!(write.is_active);
    }

    #[test]
    fn test_product_form_errors() {
        let form = ProductForm {
            name: " ".to_string(),
            slug: "Vitamin C!".to_string(),
            price: "-1".to_string(),
            category: "skincare".to_string(),
            ..ProductForm::blank()
        };
        let errors = form.validate().unwrap_err();
        for field in ["name", "slug", "price", "category"] {
            assert!(errors.has(field), "expected error on {field}");
        }

        let missing_price = ProductForm {
            price: String::new(),
            ..product_form()
        };
        assert!(missing_price.validate().unwrap_err().has("price"));
    }

    #[test]
    fn test_compare_at_price_must_exceed_price() {
        let form = ProductForm {
            compare_at_price: "2000".to_string(),
            ..product_form()
        };
        assert!(form.validate().unwrap_err().has("compare_at_price"));

        let form = ProductForm {
            compare_at_price: "3000".to_string(),
            ..product_form()
        };
        assert_eq!(form.validate().unwrap().compare_at_price, Some(Decimal::new(3000, 0)));
    }

    #[test]
    fn test_category_cannot_parent_itself() {
        let form = CategoryForm {
            name: "Serums".to_string(),
            parent: "4".to_string(),
            ..CategoryForm::blank()
        };
        assert!(form.validate(Some(CategoryId::new(4))).unwrap_err().has("parent"));
        assert_eq!(
            form.validate(Some(CategoryId::new(5))).unwrap().parent,
            Some(CategoryId::new(4))
        );
    }

    #[test]
    fn test_banner_links() {
        let form = BannerForm {
            title: "Glow week".to_string(),
            link_url: "/categories/serums".to_string(),
            image: "https://cdn.glowhaus.co/banners/glow.jpg".to_string(),
            position: "2".to_string(),
            ..BannerForm::blank()
        };
        let write = form.validate().unwrap();
        assert_eq!(write.position, 2);
        assert_eq!(write.link_url.as_deref(), Some("/categories/serums"));

        let bad = BannerForm {
            title: "Glow week".to_string(),
            link_url: "javascript:alert(1)".to_string(),
            image: "/relative.jpg".to_string(),
            position: "second".to_string(),
            ..BannerForm::blank()
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("link_url"));
        assert!(errors.has("image"));
        assert!(errors.has("position"));
    }

    #[test]
    fn test_journal_tags_are_trimmed_and_deduplicated() {
        let form = JournalForm {
            title: "Layering 101".to_string(),
            body: "Thin to thick.".to_string(),
            tags: "routine, Skincare ,, skincare".to_string(),
            ..JournalForm::default()
        };
        let write = form.validate().unwrap();
        assert_eq!(write.tags, vec!["routine".to_string(), "Skincare".to_string()]);
        assert!(!write.is_published);
    }

    #[test]
    fn test_settings_form() {
        let form = SettingsForm {
            store_name: "Glowhaus".to_string(),
            contact_email: "hello@glowhaus.co".to_string(),
            shipping_fee: "350".to_string(),
            free_shipping_threshold: String::new(),
            ..SettingsForm::default()
        };
        let settings = form.validate().unwrap();
        assert_eq!(settings.shipping_fee, Decimal::new(350, 0));
        assert_eq!(settings.free_shipping_threshold, None);
        assert_eq!(settings.tagline, None);

        let bad = SettingsForm {
            contact_email: "not-an-email".to_string(),
            shipping_fee: "3.505".to_string(),
            ..SettingsForm::default()
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("contact_email"));
        assert!(errors.has("shipping_fee"));
    }

    #[test]
    fn test_status_form() {
        let form = StatusForm {
            status: "shipped".to_string(),
        };
        assert_eq!(form.validate().unwrap(), OrderStatus::Shipped);
        let form = StatusForm {
            status: "unknown".to_string(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_settings_round_trip_through_form() {
        let settings = SiteSettings {
            store_name: Some("Glowhaus".to_string()),
            shipping_fee: Decimal::new(35_000, 2),
            free_shipping_threshold: Some(Decimal::new(500_000, 2)),
            ..SiteSettings::default()
        };
        let form = SettingsForm::from(&settings);
        assert_eq!(form.shipping_fee, "350.00");
        assert_eq!(form.validate().unwrap(), settings);
    }
}
