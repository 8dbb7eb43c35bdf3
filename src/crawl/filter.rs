//! Language filtering for crawled pages
//!
//! A heuristic, best-effort classifier over URL markers and page metadata.
//! It is not authoritative language detection and must fail open: absence of
//! evidence is not evidence of exclusion.

use crate::firecrawl::types::PageMetadata;
use std::collections::BTreeSet;

/// Decides whether a page matches the configured language constraints
#[derive(Debug, Clone)]
pub struct PageFilter {
    /// Accepted language codes; empty means no filtering
    languages: BTreeSet<String>,
}

impl PageFilter {
    /// Create a filter for the given accepted language codes
    pub fn new(languages: BTreeSet<String>) -> Self {
        Self { languages }
    }

    /// Whether the page should be persisted
    ///
    /// Policy, evaluated in order: an empty language set accepts everything;
    /// a `-<lang>` marker in the URL accepts; otherwise a metadata language
    /// is prefix-matched against the accepted codes (`en-US` matches `en`);
    /// with no signal at all the page is accepted.
    pub fn accepts(&self, url: &str, metadata: Option<&PageMetadata>) -> bool {
        if self.languages.is_empty() {
            return true;
        }

        for lang in &self.languages {
            if url.contains(&format!("-{}", lang)) {
                return true;
            }
        }

        if let Some(language) = metadata.and_then(|m| m.language.as_deref()) {
            return self.languages.iter().any(|lang| language.starts_with(lang));
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(langs: &[&str]) -> PageFilter {
        PageFilter::new(langs.iter().map(|s| s.to_string()).collect())
    }

    fn metadata_with_language(language: &str) -> PageMetadata {
        PageMetadata {
            url: None,
            language: Some(language.to_string()),
            raw_html: None,
        }
    }

    #[test]
    fn test_empty_language_set_accepts_everything() {
        let f = filter(&[]);
        assert!(f.accepts("https://example.com/docs-fr/page", None));
        assert!(f.accepts(
            "https://example.com/page",
            Some(&metadata_with_language("zh"))
        ));
    }

    #[test]
    fn test_url_marker_accepts() {
        let f = filter(&["en"]);
        assert!(f.accepts("https://example.com/docs-en/page", None));
        // URL marker wins even when metadata disagrees
        assert!(f.accepts(
            "https://example.com/docs-en/page",
            Some(&metadata_with_language("es"))
        ));
    }

    #[test]
    fn test_metadata_prefix_match() {
        let f = filter(&["en"]);
        assert!(f.accepts(
            "https://example.com/page",
            Some(&metadata_with_language("en-US"))
        ));
        assert!(!f.accepts(
            "https://example.com/docs-es/page",
            Some(&metadata_with_language("es"))
        ));
    }

    #[test]
    fn test_no_signal_fails_open() {
        let f = filter(&["en"]);
        assert!(f.accepts("https://example.com/page", None));
        assert!(f.accepts(
            "https://example.com/page",
            Some(&PageMetadata::default())
        ));
    }

    #[test]
    fn test_multiple_accepted_languages() {
        let f = filter(&["en", "fr"]);
        assert!(f.accepts(
            "https://example.com/page",
            Some(&metadata_with_language("fr-CA"))
        ));
        assert!(!f.accepts(
            "https://example.com/page",
            Some(&metadata_with_language("de"))
        ));
    }
}
