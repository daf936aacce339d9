//! Paginated list envelope.

use serde::{Deserialize, Deserializer, Serialize};

/// One page of a list endpoint.
///
/// The backend answers list calls either with a bare JSON array or with a
/// `{count, next, previous, results}` envelope depending on whether the
/// view is paginated. Both decode into `Page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total number of results across all pages.
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
    Envelope {
        count: u64,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match PageRepr::deserialize(deserializer)? {
            PageRepr::Envelope {
                count,
                next,
                previous,
                results,
            } => Self {
                count,
                next,
                previous,
                results,
            },
            PageRepr::Bare(results) => Self::from_vec(results),
        })
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T> Page<T> {
    /// Wrap an unpaginated list.
    #[must_use]
    pub fn from_vec(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of pages for a given page size (at least one).
    #[must_use]
    pub fn total_pages(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 1;
        }
        self.count.div_ceil(u64::from(page_size)).max(1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.results.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
