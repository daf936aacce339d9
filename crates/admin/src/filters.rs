//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Characters kept by [`short`] before the ellipsis.
pub const SHORT_CHARS: usize = 48;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Cut long table cells (links, subtitles) down to size.
///
/// Usage in templates: `{{ banner.link_url|short }}`
#[askama::filter_fn]
pub fn short(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string(), SHORT_CHARS))
}

/// Keep at most `max` characters, ending with an ellipsis when cut.
#[must_use]
pub fn shorten(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_leaves_short_text() {
        assert_eq!(shorten("  /collections/serums ", 48), "/collections/serums");
    }

    #[test]
    fn test_shorten_cuts_on_char_boundary() {
        assert_eq!(shorten("Crème hydratante intense", 7), "Crème…");
        assert_eq!(shorten("abcdef", 4).chars().count(), 4);
    }
}
