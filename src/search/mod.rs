//! Multi-strategy search pipeline
//!
//! Maps a site for candidate pages, scrapes them, and uses a language model
//! to judge relevance against a natural-language objective. Three strategies
//! trade latency against recall: quick fetches one best-ranked page, deep
//! ranks a batch of judged candidates, selective extracts model-derived CSS
//! selectors from the top candidates.

mod error;
mod judge;
mod orchestrator;

pub use error::SearchError;
pub use judge::{Judgment, RankedJudgment, RelevanceJudge, MAX_CONTENT_CHARS};
pub use orchestrator::SearchOrchestrator;

use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Which search strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// One hint-ranked candidate, returned raw
    Quick,
    /// Top candidates judged and ranked by relevance
    Deep,
    /// Selector-based extraction from the top candidates
    Selective,
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(SearchStrategy::Quick),
            "deep" => Ok(SearchStrategy::Deep),
            "selective" => Ok(SearchStrategy::Selective),
            other => Err(format!("unknown search strategy: {}", other)),
        }
    }
}

/// Result of the quick strategy
#[derive(Debug, Clone, Serialize)]
pub struct QuickResult {
    /// URL the content came from
    pub source_url: String,

    /// Raw scraped Markdown of the page
    pub content: String,

    /// Search hint used for the map call
    pub parameter_used: String,
}

/// One judged, matching page from the deep strategy
#[derive(Debug, Clone, Serialize)]
pub struct RankedPage {
    /// Candidate URL
    pub url: String,

    /// Scraped Markdown of the page
    pub content: String,

    /// Relevance to the objective, 0-100
    pub relevance_score: u8,

    /// Salient points the model found
    pub key_points: Vec<String>,

    /// Whether the page satisfies the objective
    pub matches_objective: bool,
}

/// Result of the deep strategy
#[derive(Debug, Clone, Serialize)]
pub struct DeepResult {
    /// Matching pages, sorted by relevance score descending
    pub results: Vec<RankedPage>,

    /// Candidates that were actually scraped and judged
    pub total_analyzed: usize,
}

/// One successfully extracted page from the selective strategy
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedPage {
    /// Candidate URL
    pub url: String,

    /// Extracted field values
    pub content: serde_json::Value,
}

/// Result of the selective strategy
#[derive(Debug, Clone, Serialize)]
pub struct SelectiveResult {
    /// Field-name to selector mapping the model derived
    pub selectors_used: BTreeMap<String, String>,

    /// Extraction results per candidate, failures skipped
    pub results: Vec<ExtractedPage>,
}

/// Outcome of one orchestrated search, tagged by strategy
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchReport {
    /// Quick strategy outcome; `None` when no candidate was found
    Quick(Option<QuickResult>),
    /// Deep strategy outcome
    Deep(DeepResult),
    /// Selective strategy outcome
    Selective(SelectiveResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("quick".parse::<SearchStrategy>().unwrap(), SearchStrategy::Quick);
        assert_eq!("deep".parse::<SearchStrategy>().unwrap(), SearchStrategy::Deep);
        assert_eq!(
            "selective".parse::<SearchStrategy>().unwrap(),
            SearchStrategy::Selective
        );
        assert!("shallow".parse::<SearchStrategy>().is_err());
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = SearchReport::Quick(Some(QuickResult {
            source_url: "https://example.com/pricing".to_string(),
            content: "# Pricing".to_string(),
            parameter_used: "pricing".to_string(),
        }));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source_url"], "https://example.com/pricing");
        assert_eq!(json["parameter_used"], "pricing");
    }
}
