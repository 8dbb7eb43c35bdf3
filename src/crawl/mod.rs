//! Incremental crawl engine
//!
//! This module owns the stateful half of a crawl run: configuration,
//! language filtering, write-once persistence, and the polling state
//! machine that ties them to the remote crawl job.

mod config;
mod error;
mod filename;
mod filter;
mod poller;
mod store;

pub use config::{CrawlConfig, CrawlConfigBuilder};
pub use error::CrawlError;
pub use filename::safe_name;
pub use filter::PageFilter;
pub use poller::{CrawlPoller, CrawlSummary};
pub use store::{PageStore, SaveOutcome};
