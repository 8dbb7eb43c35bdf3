//! Error types for the crawl engine

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawl engine operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The crawl job could not be created; fatal to the run
    #[error("crawl submission failed: {0}")]
    Submission(#[source] CrateError),

    /// A status poll failed; fatal to the run, no automatic retry
    #[error("status poll failed: {0}")]
    Poll(#[source] CrateError),

    /// A single page failed to persist; absorbed by the poller
    #[error("failed to write page {url}: {source}")]
    PageWrite {
        /// URL of the page that failed to persist
        url: String,
        /// Underlying filesystem error
        source: std::io::Error,
    },

    /// Invalid crawl configuration
    #[error("invalid crawl configuration: {0}")]
    Config(String),

    /// Filesystem error outside per-page writes (directories, manifest)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Io(e) => CrateError::Io(e),
            other => CrateError::Crawl(other.to_string()),
        }
    }
}
