//! Bound the size of tool results before they re-enter the conversation.
//!
//! Lengths are counted in characters, not bytes, and the cut is not aware
//! of the result's structure: JSON may be cut mid-value.

use tracing::warn;

/// Appended to every truncated result.
pub const TRUNCATION_MARKER: &str = "\n... [truncated for token efficiency]";

/// Return `raw` unchanged when it has at most `limit` characters, otherwise
/// its first `limit` characters followed by [`TRUNCATION_MARKER`].
pub fn truncate(raw: &str, limit: usize) -> String {
    match raw.char_indices().nth(limit) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&raw[..cut]);
            out.push_str(TRUNCATION_MARKER);
            out
        }
        None => raw.to_string(),
    }
}

/// [`truncate`] with a fixed limit, logging every cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultTruncator {
    limit: usize,
}

impl ResultTruncator {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn apply(&self, tool: &str, raw: &str) -> String {
        let out = truncate(raw, self.limit);
        if out != raw {
            warn!(
                tool,
                original_chars = raw.chars().count(),
                limit = self.limit,
                "tool result truncated"
            );
        }
        out
    }
}

impl Default for ResultTruncator {
    fn default() -> Self {
        Self::new(adopilot_core::config::DEFAULT_MAX_RESULT_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_exact_limit_unchanged() {
        let s = "x".repeat(10_000);
        assert_eq!(truncate(&s, 10_000), s);
    }

    #[test]
    fn test_over_limit() {
        let s = "a".repeat(15_000);
        let out = truncate(&s, 10_000);
        assert_eq!(out.chars().count(), 10_000 + TRUNCATION_MARKER.chars().count());
        assert!(out.starts_with(&"a".repeat(10_000)));
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_one_over_limit() {
        assert_eq!(truncate("abcd", 3), format!("abc{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // Four characters, twelve bytes.
        let s = "日本語字";
        assert_eq!(truncate(s, 4), s);
        assert_eq!(truncate(s, 2), format!("日本{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_zero_limit() {
        assert_eq!(truncate("abc", 0), TRUNCATION_MARKER);
    }

    #[test]
    fn test_truncator_default_limit() {
        let truncator = ResultTruncator::default();
        assert_eq!(truncator.limit(), 10_000);
        let out = truncator.apply("wit_get_work_item", &"{".repeat(10_001));
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(truncator.apply("wiki_list", "[]"), "[]");
    }
}
