//! Typed request and response structures for the Firecrawl-compatible API
//!
//! Every endpoint gets an explicit serde struct, validated at the HTTP
//! boundary. Wire field names are camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel sent as `limit` when no page cap was configured
pub const UNLIMITED_PAGES: u32 = 1_000_000;

/// Request body for `POST /v1/crawl`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    /// Root URL of the crawl
    pub url: String,

    /// Maximum link depth to follow
    pub max_depth: u32,

    /// Whether to follow links to subdomains of the root host
    pub allow_subdomains: bool,

    /// Whether to follow links off the root domain entirely
    pub allow_external_links: bool,

    /// Page cap; [`UNLIMITED_PAGES`] when unbounded
    pub limit: u32,

    /// URL glob patterns to exclude, omitted when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,

    /// URL glob patterns to include, omitted when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_patterns: Vec<String>,
}

/// Response body for `POST /v1/crawl`
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSubmitResponse {
    /// Opaque job identifier used for status polls
    pub id: String,
}

/// Terminal/non-terminal state of a remote crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// The job is still discovering pages
    Running,
    /// The job has finished; no further pages will appear
    Completed,
}

/// Response body for `GET /v1/crawl/{id}` - one point-in-time snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlJobSnapshot {
    /// Whether the remote job is still running
    pub status: JobStatus,

    /// Pages processed so far
    #[serde(default)]
    pub completed: u64,

    /// Pages the job expects to process in total
    #[serde(default)]
    pub total: u64,

    /// Pages finished since the job started; may repeat across polls
    #[serde(default)]
    pub data: Vec<PageRecord>,
}

/// One crawled page inside a snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct PageRecord {
    /// Page content rendered as Markdown
    #[serde(default)]
    pub markdown: Option<String>,

    /// Metadata attached to the page
    #[serde(default)]
    pub metadata: Option<PageMetadata>,
}

/// Metadata carried with a crawled or scraped page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Source URL of the page
    pub url: Option<String>,

    /// Declared content language, e.g. `en-US`
    pub language: Option<String>,

    /// Raw HTML of the page when the service captured it
    pub raw_html: Option<String>,
}

/// Request body for `POST /v1/map`
#[derive(Debug, Clone, Serialize)]
pub struct MapRequest {
    /// Site to map
    pub url: String,

    /// Optional search hint to rank candidate URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Response body for `POST /v1/map`
#[derive(Debug, Clone, Deserialize)]
pub struct MapResponse {
    /// Candidate URLs, best first; empty means "no candidates found"
    #[serde(default)]
    pub links: Vec<String>,
}

/// Request body for `POST /v1/scrape`
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRequest {
    /// Page to scrape
    pub url: String,

    /// Output formats to produce; always `["markdown"]` here
    pub formats: Vec<String>,

    /// Per-request timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Response body for `POST /v1/scrape`
///
/// Firecrawl wraps the payload in a `data` envelope; older deployments
/// return the fields at the top level. Both shapes are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeResponse {
    /// Scraped Markdown content when returned at the top level
    #[serde(default)]
    pub markdown: Option<String>,

    /// Enveloped payload
    #[serde(default)]
    pub data: Option<ScrapeData>,
}

/// Inner payload of an enveloped scrape response
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeData {
    /// Scraped Markdown content
    #[serde(default)]
    pub markdown: Option<String>,
}

impl ScrapeResponse {
    /// Extract the Markdown content from either response shape
    pub fn into_markdown(self) -> Option<String> {
        self.markdown.or(self.data.and_then(|d| d.markdown))
    }
}

/// Request body for selector-based extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractRequest {
    /// Page to extract from
    pub url: String,

    /// Mapping of field name to CSS-selector-like pattern
    pub selectors: BTreeMap<String, String>,
}

/// Response body for selector-based extraction: field name to extracted value
pub type ExtractResponse = serde_json::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_request_omits_empty_patterns() {
        let request = CrawlRequest {
            url: "https://example.com".to_string(),
            max_depth: 10,
            allow_subdomains: true,
            allow_external_links: false,
            limit: UNLIMITED_PAGES,
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["maxDepth"], 10);
        assert_eq!(json["allowExternalLinks"], false);
        assert!(json.get("excludePatterns").is_none());
        assert!(json.get("includePatterns").is_none());
    }

    #[test]
    fn test_snapshot_deserializes_wire_shape() {
        let body = r##"{
            "status": "running",
            "completed": 3,
            "total": 12,
            "data": [
                {"markdown": "# Hi", "metadata": {"url": "https://example.com/a", "language": "en-US"}}
            ]
        }"##;

        let snapshot: CrawlJobSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.status, JobStatus::Running);
        assert_eq!(snapshot.completed, 3);
        assert_eq!(snapshot.total, 12);
        assert_eq!(snapshot.data.len(), 1);
        assert_eq!(
            snapshot.data[0].metadata.as_ref().unwrap().url.as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn test_snapshot_tolerates_missing_counters() {
        let snapshot: CrawlJobSnapshot = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.completed, 0);
        assert!(snapshot.data.is_empty());
    }

    #[test]
    fn test_scrape_response_accepts_both_shapes() {
        let flat: ScrapeResponse = serde_json::from_str(r#"{"markdown": "flat"}"#).unwrap();
        assert_eq!(flat.into_markdown().as_deref(), Some("flat"));

        let enveloped: ScrapeResponse =
            serde_json::from_str(r#"{"data": {"markdown": "wrapped"}}"#).unwrap();
        assert_eq!(enveloped.into_markdown().as_deref(), Some("wrapped"));
    }
}
