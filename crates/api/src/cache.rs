//! Cached catalog responses.

use glowhaus_core::models::{Banner, Category, JournalEntry, Page, Product, SiteSettings};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
    Categories(Vec<Category>),
    Banners(Vec<Banner>),
    Journal(Page<JournalEntry>),
    Settings(Box<SiteSettings>),
}

/// Build a cache key from a path and its query pairs.
pub fn key(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_owned();
    }
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{path}?{}", pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_independent() {
        let a = key(
            "/products/products/",
            &[("page".into(), "2".into()), ("category".into(), "serums".into())],
        );
        let b = key(
            "/products/products/",
            &[("category".into(), "serums".into()), ("page".into(), "2".into())],
        );
        assert_eq!(a, b);
        assert_eq!(key("/settings/", &[]), "/settings/");
    }
}
