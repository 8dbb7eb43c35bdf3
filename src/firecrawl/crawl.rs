//! Crawl job service for the Firecrawl-compatible API
//!
//! Submitting a job and polling its status are single request/response
//! calls. Retry and backoff live in the poller, not here.

use crate::error::{Error, Result};
use crate::firecrawl::http::HttpClient;
use crate::firecrawl::types::{CrawlJobSnapshot, CrawlRequest, CrawlSubmitResponse};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Interface to the remote crawl job endpoints
///
/// The poller works against this trait so tests can drive it with scripted
/// snapshots instead of a live service.
#[async_trait]
pub trait CrawlApi: Send + Sync {
    /// Submit a crawl job, returning its opaque id
    async fn submit(&self, request: CrawlRequest) -> Result<String>;

    /// Fetch a point-in-time snapshot of a running or finished job
    async fn poll(&self, job_id: &str) -> Result<CrawlJobSnapshot>;
}

/// Service for submitting and polling crawl jobs
#[derive(Debug, Clone)]
pub struct CrawlService {
    /// HTTP client for making API requests
    http_client: HttpClient,
}

impl CrawlService {
    /// Create a new crawl service
    pub(crate) fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl CrawlApi for CrawlService {
    #[instrument(skip(self, request), level = "debug")]
    async fn submit(&self, request: CrawlRequest) -> Result<String> {
        debug!("Submitting crawl job for {}", request.url);
        let response: CrawlSubmitResponse = self
            .http_client
            .post("v1/crawl", &request)
            .await
            .map_err(|e| match e {
                Error::Api {
                    status_code,
                    message,
                } => Error::Crawl(format!(
                    "crawl submission rejected ({}): {}",
                    status_code, message
                )),
                other => other,
            })?;
        Ok(response.id)
    }

    #[instrument(skip(self), level = "debug")]
    async fn poll(&self, job_id: &str) -> Result<CrawlJobSnapshot> {
        debug!("Polling crawl job {}", job_id);
        self.http_client.get(&format!("v1/crawl/{}", job_id)).await
    }
}
