//! Site map service for the Firecrawl-compatible API

use crate::error::Result;
use crate::firecrawl::http::HttpClient;
use crate::firecrawl::types::{MapRequest, MapResponse};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Interface to the remote map endpoint
#[async_trait]
pub trait MapApi: Send + Sync {
    /// Map a site to an ordered list of candidate URLs
    ///
    /// An empty list is a valid outcome meaning "no candidates found".
    async fn map(&self, url: &str, search: Option<&str>) -> Result<Vec<String>>;
}

/// Service for mapping a site's URLs
#[derive(Debug, Clone)]
pub struct MapService {
    /// HTTP client for making API requests
    http_client: HttpClient,
}

impl MapService {
    /// Create a new map service
    pub(crate) fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl MapApi for MapService {
    #[instrument(skip(self), level = "debug")]
    async fn map(&self, url: &str, search: Option<&str>) -> Result<Vec<String>> {
        let request = MapRequest {
            url: url.to_string(),
            search: search.map(str::to_string),
        };

        debug!("Mapping {} (search: {:?})", url, search);
        let response: MapResponse = self.http_client.post("v1/map", &request).await?;
        debug!("Map returned {} candidate links", response.links.len());
        Ok(response.links)
    }
}
