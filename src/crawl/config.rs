//! # Crawl Configuration Module
//!
//! Configuration for one crawl run, built once before the poller starts and
//! immutable afterwards. Uses a builder pattern for flexible construction.
//!
//! The output directory is resolved exactly once, at build time, from the
//! URL's host component when not explicitly supplied.

use crate::crawl::error::CrawlError;
use crate::firecrawl::types::{CrawlRequest, UNLIMITED_PAGES};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Configuration for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Root URL of the crawl
    pub url: String,

    /// Maximum link depth to follow
    pub max_depth: u32,

    /// Maximum number of pages to crawl; `None` means unbounded
    pub max_pages: Option<u32>,

    /// Whether to follow links off the root domain
    pub allow_external: bool,

    /// Whether to follow links to subdomains of the root host
    pub allow_subdomains: bool,

    /// Language codes to accept; empty means accept all
    pub languages: BTreeSet<String>,

    /// URL glob patterns to exclude
    pub exclude_patterns: Vec<String>,

    /// URL glob patterns to include
    pub include_patterns: Vec<String>,

    /// Directory pages are written to
    pub output_dir: PathBuf,

    /// Whether to keep a raw HTML sibling next to each Markdown file
    pub save_raw_html: bool,

    /// Seconds to sleep between status polls
    pub check_interval_secs: u64,

    /// Per-request timeout in milliseconds, forwarded to the service
    pub timeout_ms: u64,
}

impl CrawlConfig {
    /// Create a new builder for the given root URL
    ///
    /// Fails when the URL cannot be parsed or has no host, since the host is
    /// needed to derive the default output directory.
    pub fn builder(url: impl Into<String>) -> Result<CrawlConfigBuilder, CrawlError> {
        CrawlConfigBuilder::new(url)
    }

    /// The polling interval as a Duration
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Convert this configuration into the crawl submission request
    pub fn to_request(&self) -> CrawlRequest {
        CrawlRequest {
            url: self.url.clone(),
            max_depth: self.max_depth,
            allow_subdomains: self.allow_subdomains,
            allow_external_links: self.allow_external,
            limit: self.max_pages.unwrap_or(UNLIMITED_PAGES),
            exclude_patterns: self.exclude_patterns.clone(),
            include_patterns: self.include_patterns.clone(),
        }
    }
}

/// Builder for CrawlConfig
#[derive(Debug)]
pub struct CrawlConfigBuilder {
    url: String,
    host: String,
    max_depth: u32,
    max_pages: Option<u32>,
    allow_external: bool,
    allow_subdomains: bool,
    languages: BTreeSet<String>,
    exclude_patterns: Vec<String>,
    include_patterns: Vec<String>,
    output_dir: Option<PathBuf>,
    save_raw_html: bool,
    check_interval_secs: u64,
    timeout_ms: u64,
}

impl CrawlConfigBuilder {
    /// Create a builder with defaults matching a polite documentation crawl
    pub fn new(url: impl Into<String>) -> Result<Self, CrawlError> {
        let url = url.into();
        let parsed =
            Url::parse(&url).map_err(|e| CrawlError::Config(format!("invalid URL {}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| CrawlError::Config(format!("URL {} has no host", url)))?
            .to_string();

        Ok(Self {
            url,
            host,
            max_depth: 10,
            max_pages: None,
            allow_external: false,
            allow_subdomains: true,
            languages: BTreeSet::new(),
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            output_dir: None,
            save_raw_html: false,
            check_interval_secs: 5,
            timeout_ms: 30_000,
        })
    }

    /// Set the maximum depth to crawl
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set whether to follow links off the root domain
    pub fn allow_external(mut self, allow_external: bool) -> Self {
        self.allow_external = allow_external;
        self
    }

    /// Set whether to follow links to subdomains
    pub fn allow_subdomains(mut self, allow_subdomains: bool) -> Self {
        self.allow_subdomains = allow_subdomains;
        self
    }

    /// Set the language codes to accept; an empty set accepts all pages
    pub fn languages(mut self, languages: BTreeSet<String>) -> Self {
        self.languages = languages;
        self
    }

    /// Set the URL glob patterns to exclude
    pub fn exclude_patterns(mut self, exclude_patterns: Vec<String>) -> Self {
        self.exclude_patterns = exclude_patterns;
        self
    }

    /// Set the URL glob patterns to include
    pub fn include_patterns(mut self, include_patterns: Vec<String>) -> Self {
        self.include_patterns = include_patterns;
        self
    }

    /// Set an explicit output directory
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Set whether to keep a raw HTML sibling next to each Markdown file
    pub fn save_raw_html(mut self, save_raw_html: bool) -> Self {
        self.save_raw_html = save_raw_html;
        self
    }

    /// Set the seconds to sleep between status polls
    pub fn check_interval_secs(mut self, check_interval_secs: u64) -> Self {
        self.check_interval_secs = check_interval_secs;
        self
    }

    /// Set the per-request timeout in milliseconds
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Build the configuration, deriving the output directory if unset
    pub fn build(self) -> CrawlConfig {
        let output_dir = self
            .output_dir
            .unwrap_or_else(|| PathBuf::from("crawls").join(&self.host));

        CrawlConfig {
            url: self.url,
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            allow_external: self.allow_external,
            allow_subdomains: self.allow_subdomains,
            languages: self.languages,
            exclude_patterns: self.exclude_patterns,
            include_patterns: self.include_patterns,
            output_dir,
            save_raw_html: self.save_raw_html,
            check_interval_secs: self.check_interval_secs,
            timeout_ms: self.timeout_ms,
        }
    }
}
