//! Input normalization for cache keys and wire payloads.
//! Markup is stripped before both, so rich-text and plain-text callers of
//! the same string share one cache entry and tags never reach the provider.

use regex::Regex;

/// Strips markup tags and collapses whitespace runs.
pub struct MarkupStripper {
    tags: Regex,
    spaces: Regex,
}

impl MarkupStripper {
    pub fn new() -> Self {
        Self {
            // Tag spans become a space so adjacent words stay separated
            tags: Regex::new(r"<[^>]*>").unwrap(),
            spaces: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Replace every tag span with a space, collapse whitespace, trim.
    /// An empty result means the input carried no translatable text.
    pub fn strip(&self, text: &str) -> String {
        let without_tags = self.tags.replace_all(text, " ");
        self.spaces
            .replace_all(&without_tags, " ")
            .trim()
            .to_string()
    }
}

/// Lowercase and trim a language code, then map application-internal
/// aliases onto the codes the provider expects. Unknown codes pass through
/// unchanged so new provider languages need no code change here.
pub fn resolve_lang(code: &str) -> String {
    let code = code.trim().to_lowercase();
    match code.as_str() {
        // Aliases that appear in stored site settings
        "jp" => "ja",
        "kr" => "ko",
        "cn" => "zh-CN",
        "ua" => "uk",
        _ => return code,
    }
    .to_string()
}
