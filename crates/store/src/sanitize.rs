//! Review comment sanitization.
//!
//! Comments are persisted as sanitized plain text: all HTML elements are
//! stripped (script and style contents are discarded entirely) and the
//! remaining text is entity-escaped. Sanitization happens on every write
//! path - submit and update - never on read.

use std::collections::HashSet;

/// Strip HTML/script content from a review comment.
#[must_use]
pub fn clean_comment(raw: &str) -> String {
    ammonia::Builder::new()
        .tags(HashSet::new())
        .clean(raw)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(clean_comment("Great value for the price."), "Great value for the price.");
    }

    #[test]
    fn test_strips_tags_keeps_text() {
        assert_eq!(clean_comment("<b>great</b> product"), "great product");
        assert_eq!(
            clean_comment("<a href=\"https://spam.example\">click</a> here"),
            "click here"
        );
    }

    #[test]
    fn test_discards_script_content() {
        assert_eq!(clean_comment("<script>alert('x')</script>ok"), "ok");
        assert_eq!(clean_comment("fine<style>p{}</style>"), "fine");
    }

    #[test]
    fn test_escapes_markup_characters() {
        assert_eq!(clean_comment("cheap & cheerful"), "cheap &amp; cheerful");
    }

    #[test]
    fn test_empty_comment() {
        assert_eq!(clean_comment(""), "");
    }
}
