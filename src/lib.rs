//! # firescout - Crawl orchestration and LLM-assisted site search
//!
//! This crate drives long-running crawl jobs against a Firecrawl-compatible
//! HTTP service, persisting pages to disk as they are discovered, and runs a
//! multi-strategy search pipeline that maps a site, scrapes candidate pages,
//! and uses a language model to judge relevance and extract structured data.
//!
//! ## Features
//!
//! - Incremental crawl polling with cross-poll deduplication
//! - Write-once page persistence with a sorted visited-URL manifest
//! - Interrupt-safe shutdown: partial progress is always flushed
//! - Three search strategies: quick (first hit), deep (ranked batch),
//!   selective (CSS-selector extraction)
//! - Typed facades over the crawl and language-model APIs
//! - Async API with Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use firescout::crawl::{CrawlConfig, CrawlPoller};
//! use firescout::firecrawl;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = firecrawl::Client::new("http://localhost:3002", None);
//!     let config = CrawlConfig::builder("https://example.com")?.build();
//!     let (_tx, shutdown) = watch::channel(false);
//!
//!     let poller = CrawlPoller::new(client.crawl(), config);
//!     let summary = poller.run(shutdown).await?;
//!     println!("saved {} pages", summary.saved);
//!     Ok(())
//! }
//! ```

mod error;

pub mod anthropic;
pub mod crawl;
pub mod firecrawl;
pub mod search;

pub use error::Error;

/// Re-export of common types for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
