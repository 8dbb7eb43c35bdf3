//! Error types for the search pipeline

use crate::error::Error as CrateError;
use thiserror::Error;

/// Errors that abort a whole search strategy
///
/// Per-candidate failures (a scrape, judgment, or extraction for one URL)
/// are absorbed inside the orchestrator and never surface here.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A model call needed to establish the unit of work failed
    #[error("model call failed: {0}")]
    Model(#[source] CrateError),

    /// The initial site map call failed
    #[error("site map failed: {0}")]
    Map(#[source] CrateError),

    /// A scrape that the strategy cannot proceed without failed
    #[error("scrape failed: {0}")]
    Scrape(#[source] CrateError),

    /// The model returned something that was not the JSON the strategy needs
    #[error("failed to parse model response: {0}")]
    Parse(String),
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        CrateError::Search(err.to_string())
    }
}
