//! Client for the Firecrawl-compatible crawl/map/scrape API
//!
//! This module is a thin, typed facade over the remote service. It owns no
//! orchestration state: each service method is one request/response call
//! with structured results and errors.

mod crawl;
mod http;
mod map;
mod scrape;
pub mod types;

pub use crawl::{CrawlApi, CrawlService};
pub use http::HttpClient;
pub use map::{MapApi, MapService};
pub use scrape::{ScrapeApi, ScrapeService};

use std::time::Duration;

/// Client for the Firecrawl-compatible API
///
/// This is the entry point for talking to the crawl service. It provides
/// access to the crawl-job, map, and scrape services, which all share one
/// underlying HTTP client.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: HttpClient,
    timeout_ms: u64,
}

impl Client {
    /// Create a new client for the given service endpoint
    ///
    /// `api_key`, when present, is sent as a bearer token on every request.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_timeout_ms(base_url, api_key, 30_000)
    }

    /// Create a new client with a custom per-request timeout
    pub fn with_timeout_ms(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_ms: u64,
    ) -> Self {
        let http_client =
            HttpClient::with_timeout(base_url, api_key, Duration::from_millis(timeout_ms));
        Self {
            http_client,
            timeout_ms,
        }
    }

    /// Access the crawl job service
    pub fn crawl(&self) -> CrawlService {
        CrawlService::new(self.http_client.clone())
    }

    /// Access the site map service
    pub fn map(&self) -> MapService {
        MapService::new(self.http_client.clone())
    }

    /// Access the scrape service
    pub fn scrape(&self) -> ScrapeService {
        ScrapeService::new(self.http_client.clone(), self.timeout_ms)
    }
}
