//! Editorial content: home-page banners and journal entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BannerId, JournalEntryId};

/// A promotional banner on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, alias = "link")]
    pub link_url: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default = "super::default_true")]
    pub is_active: bool,
    /// Sort position, lowest first.
    #[serde(default, alias = "order")]
    pub position: i32,
}

/// Payload for creating or updating a banner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BannerWrite {
    pub title: String,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub link_url: Option<String>,
    pub button_text: Option<String>,
    pub is_active: bool,
    pub position: i32,
}

/// A journal (blog) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Markdown source. Omitted on list responses.
    #[serde(default, alias = "content")]
    pub body: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "super::default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Rough reading time at 200 words per minute, at least one minute.
    #[must_use]
    pub fn reading_minutes(&self) -> usize {
        self.body.split_whitespace().count().div_ceil(200).max(1)
    }
}

/// Payload for creating or updating a journal entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalWrite {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub is_published: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_journal_list_item_without_body() {
        let entry: JournalEntry = serde_json::from_value(json!({
            "id": 3,
            "title": "Building a routine",
            "slug": "building-a-routine",
        }))
        .unwrap();
        assert_eq!(entry.body, "");
        assert_eq!(entry.reading_minutes(), 1);
        assert!(entry.is_published);
    }

    #[test]
    fn test_reading_minutes_rounds_up() {
        let mut entry: JournalEntry = serde_json::from_value(json!({
            "id": 3, "title": "t", "slug": "t"
        }))
        .unwrap();
        entry.body = "word ".repeat(401);
        assert_eq!(entry.reading_minutes(), 3);
    }

    #[test]
    fn test_banner_aliases() {
        let banner: Banner = serde_json::from_value(json!({
            "id": 1, "title": "New in", "link": "/products", "order": 2
        }))
        .unwrap();
        assert_eq!(banner.link_url.as_deref(), Some("/products"));
        assert_eq!(banner.position, 2);
    }
}
