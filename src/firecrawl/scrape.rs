//! Scrape and extraction service for the Firecrawl-compatible API

use crate::error::{Error, Result};
use crate::firecrawl::http::HttpClient;
use crate::firecrawl::types::{ExtractRequest, ExtractResponse, ScrapeRequest, ScrapeResponse};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Interface to the remote scrape and extraction endpoints
#[async_trait]
pub trait ScrapeApi: Send + Sync {
    /// Scrape a single page as Markdown
    async fn scrape(&self, url: &str) -> Result<String>;

    /// Extract named regions of a page using CSS-selector-like patterns
    async fn extract(&self, url: &str, selectors: &BTreeMap<String, String>) -> Result<ExtractResponse>;
}

/// Service for scraping individual pages
#[derive(Debug, Clone)]
pub struct ScrapeService {
    /// HTTP client for making API requests
    http_client: HttpClient,

    /// Per-request timeout in milliseconds, forwarded to the service
    timeout_ms: u64,
}

impl ScrapeService {
    /// Create a new scrape service
    pub(crate) fn new(http_client: HttpClient, timeout_ms: u64) -> Self {
        Self {
            http_client,
            timeout_ms,
        }
    }
}

#[async_trait]
impl ScrapeApi for ScrapeService {
    #[instrument(skip(self), level = "debug")]
    async fn scrape(&self, url: &str) -> Result<String> {
        let request = ScrapeRequest {
            url: url.to_string(),
            formats: vec!["markdown".to_string()],
            timeout: Some(self.timeout_ms),
        };

        debug!("Scraping {}", url);
        let response: ScrapeResponse = self.http_client.post("v1/scrape", &request).await?;
        response
            .into_markdown()
            .ok_or_else(|| Error::UnexpectedResponse(format!("no markdown returned for {}", url)))
    }

    #[instrument(skip(self, selectors), level = "debug")]
    async fn extract(&self, url: &str, selectors: &BTreeMap<String, String>) -> Result<ExtractResponse> {
        let request = ExtractRequest {
            url: url.to_string(),
            selectors: selectors.clone(),
        };

        debug!("Extracting {} fields from {}", selectors.len(), url);
        self.http_client.post("v1/scrape", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scrape_returns_markdown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/scrape")
            .with_status(200)
            .with_body(r##"{"data": {"markdown": "# Pricing"}}"##)
            .create_async()
            .await;

        let service = ScrapeService::new(HttpClient::new(server.url(), None), 30_000);
        let markdown = service.scrape("https://example.com/pricing").await.unwrap();

        assert_eq!(markdown, "# Pricing");
    }

    #[tokio::test]
    async fn test_scrape_without_markdown_is_unexpected_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/scrape")
            .with_status(200)
            .with_body(r#"{}"#)
            .create_async()
            .await;

        let service = ScrapeService::new(HttpClient::new(server.url(), None), 30_000);
        let err = service.scrape("https://example.com").await.unwrap_err();

        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_extract_posts_selectors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/scrape")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "url": "https://example.com",
                "selectors": {"title": "h1"},
            })))
            .with_status(200)
            .with_body(r#"{"title": "Example"}"#)
            .create_async()
            .await;

        let service = ScrapeService::new(HttpClient::new(server.url(), None), 30_000);
        let mut selectors = BTreeMap::new();
        selectors.insert("title".to_string(), "h1".to_string());

        let value = service
            .extract("https://example.com", &selectors)
            .await
            .unwrap();
        assert_eq!(value["title"], "Example");
    }
}
