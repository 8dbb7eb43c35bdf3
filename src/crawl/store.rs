//! On-disk persistence for crawled pages
//!
//! Pages are written once and never overwritten: a file that already exists
//! for a URL's derived name is left untouched, which makes persistence
//! idempotent across duplicate snapshot entries and re-runs into the same
//! directory. The visited-URL manifest is the one file that is always
//! rewritten whole.

use crate::crawl::error::CrawlError;
use crate::crawl::filename::safe_name;
use crate::firecrawl::types::PageMetadata;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

/// Name of the visited-URL manifest file
const MANIFEST_FILE: &str = "visited_urls.txt";

/// Result of attempting to persist one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The page was written
    Saved,
    /// A file for this URL already existed; nothing was touched
    SkippedExisting,
}

/// Write-once page store rooted at one output directory
#[derive(Debug, Clone)]
pub struct PageStore {
    /// Directory pages are written to
    dir: PathBuf,

    /// Whether to keep a raw HTML sibling next to each Markdown file
    save_raw_html: bool,
}

impl PageStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>, save_raw_html: bool) -> Self {
        Self {
            dir: dir.into(),
            save_raw_html,
        }
    }

    /// The directory this store writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<(), CrawlError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// File path a URL's content would be written to
    fn page_path(&self, url: &str) -> PathBuf {
        // A URL that fails to parse still gets a stable name from its raw text
        let url_path = Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        self.dir.join(format!("{}.md", safe_name(&url_path)))
    }

    /// Persist one page's Markdown content, never overwriting prior output
    ///
    /// When configured, a `.md.html` sibling holding the raw HTML is written
    /// alongside. A write failure is returned as [`CrawlError::PageWrite`]
    /// for the caller to absorb; it must not abort the run.
    pub async fn save(
        &self,
        url: &str,
        markdown: &str,
        metadata: &PageMetadata,
    ) -> Result<SaveOutcome, CrawlError> {
        let path = self.page_path(url);

        if fs::try_exists(&path).await.unwrap_or(false) {
            debug!("Skipping existing file {}", path.display());
            return Ok(SaveOutcome::SkippedExisting);
        }

        fs::write(&path, markdown)
            .await
            .map_err(|source| CrawlError::PageWrite {
                url: url.to_string(),
                source,
            })?;

        if self.save_raw_html {
            if let Some(raw_html) = &metadata.raw_html {
                let html_path = path.with_extension("md.html");
                if let Err(e) = fs::write(&html_path, raw_html).await {
                    // The markdown made it to disk; losing the HTML sibling
                    // is not worth failing the page for.
                    warn!("Failed to write raw HTML {}: {}", html_path.display(), e);
                }
            }
        }

        debug!("Saved {}", path.display());
        Ok(SaveOutcome::Saved)
    }

    /// Overwrite the manifest with all visited URLs, sorted, one per line
    pub async fn write_manifest(&self, visited: &BTreeSet<String>) -> Result<(), std::io::Error> {
        let mut contents = String::new();
        for url in visited {
            contents.push_str(url);
            contents.push('\n');
        }
        fs::write(self.dir.join(MANIFEST_FILE), contents).await
    }
}
