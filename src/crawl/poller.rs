//! Crawl polling state machine
//!
//! Drives one crawl run end to end: submit the job, poll its status on a
//! fixed interval, persist newly discovered pages as they arrive, and write
//! the visited-URL manifest before reporting a summary. The manifest write
//! happens on every exit path - normal completion, interruption, and poll
//! failure - so partial progress is never lost.

use crate::crawl::config::CrawlConfig;
use crate::crawl::error::CrawlError;
use crate::crawl::filter::PageFilter;
use crate::crawl::store::{PageStore, SaveOutcome};
use crate::firecrawl::types::JobStatus;
use crate::firecrawl::CrawlApi;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Final accounting for one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages written to disk
    pub saved: u64,

    /// Pages skipped: language-filtered, already on disk, or repeated in a
    /// later snapshot
    pub skipped: u64,

    /// Pages that failed to persist or arrived without a usable record
    pub errors: u64,

    /// Distinct URLs processed during the run
    pub visited: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Whether the run ended through the interruption path
    pub interrupted: bool,
}

impl CrawlSummary {
    /// Average throughput over the run
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.visited as f64 / secs
        } else {
            0.0
        }
    }
}

/// State machine driving submit, poll, persist, and terminate
///
/// Runs strictly sequentially: page processing happens in snapshot order and
/// poll N+1 never starts before poll N's pages and sleep complete. The
/// visited set is owned exclusively by the poller and only ever grows.
pub struct CrawlPoller<A: CrawlApi> {
    api: A,
    config: CrawlConfig,
}

impl<A: CrawlApi> CrawlPoller<A> {
    /// Create a poller for one run
    pub fn new(api: A, config: CrawlConfig) -> Self {
        Self { api, config }
    }

    /// Run the crawl to completion or interruption
    ///
    /// `shutdown` is a cooperative cancellation signal: flipping it to `true`
    /// stops the run at the next page or sleep boundary and still flushes
    /// the manifest. Submission failure is terminal and reported before any
    /// output directory is touched.
    pub async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<CrawlSummary, CrawlError> {
        info!("Starting crawl of {}", self.config.url);

        let job_id = self
            .api
            .submit(self.config.to_request())
            .await
            .map_err(CrawlError::Submission)?;
        info!("Crawl job {} accepted", job_id);

        let store = PageStore::new(&self.config.output_dir, self.config.save_raw_html);
        store.ensure_dir().await?;
        let filter = PageFilter::new(self.config.languages.clone());

        let start = Instant::now();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut saved: u64 = 0;
        let mut skipped: u64 = 0;
        let mut errors: u64 = 0;
        let mut last_progress: Option<(u64, u64)> = None;
        let mut interrupted = false;
        let mut shutdown_open = true;
        let mut failure: Option<CrawlError> = None;

        'poll: loop {
            if *shutdown.borrow() {
                interrupted = true;
                break;
            }

            let snapshot = match self.api.poll(&job_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    failure = Some(CrawlError::Poll(e));
                    break;
                }
            };

            for record in &snapshot.data {
                if *shutdown.borrow() {
                    interrupted = true;
                    break 'poll;
                }

                let url = record
                    .metadata
                    .as_ref()
                    .and_then(|m| m.url.as_deref())
                    .map(str::to_string);
                let (url, markdown, metadata) = match (url, &record.markdown, &record.metadata) {
                    (Some(url), Some(markdown), Some(metadata)) => (url, markdown, metadata),
                    _ => {
                        warn!("Snapshot record without url or markdown; counting as error");
                        errors += 1;
                        continue;
                    }
                };

                // A URL is visited exactly once per run even when its record
                // repeats across polls.
                if visited.contains(&url) {
                    skipped += 1;
                    continue;
                }

                if !filter.accepts(&url, Some(metadata)) {
                    debug!("Skipped non-matching language page: {}", url);
                    skipped += 1;
                } else {
                    match store.save(&url, markdown, metadata).await {
                        Ok(SaveOutcome::Saved) => saved += 1,
                        Ok(SaveOutcome::SkippedExisting) => skipped += 1,
                        Err(e) => {
                            error!("Error saving {}: {}", url, e);
                            errors += 1;
                        }
                    }
                }

                visited.insert(url);
            }

            let progress = (snapshot.completed, snapshot.total);
            if progress_changed(&mut last_progress, progress) {
                let (completed, total) = progress;
                let percentage = if total > 0 {
                    completed as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                let elapsed = start.elapsed().as_secs_f64();
                let rate = if elapsed > 0.0 {
                    completed as f64 / elapsed
                } else {
                    0.0
                };
                info!(
                    "Progress: {}/{} pages ({:.1}%) - {:.1} pages/sec | saved {} skipped {} errors {}",
                    completed, total, percentage, rate, saved, skipped, errors
                );
            }

            if snapshot.status == JobStatus::Completed {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.check_interval()) => {}
                changed = shutdown.changed(), if shutdown_open => {
                    match changed {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                interrupted = true;
                                break;
                            }
                        }
                        Err(_) => {
                            // Sender dropped: a shutdown signal can never
                            // arrive now, so stop selecting on the channel.
                            shutdown_open = false;
                            tokio::time::sleep(self.config.check_interval()).await;
                        }
                    }
                }
            }
        }

        if interrupted {
            warn!("Crawl interrupted; flushing progress");
        }

        // Draining: the manifest is written on every exit path.
        if let Err(e) = store.write_manifest(&visited).await {
            if failure.is_none() {
                failure = Some(CrawlError::Io(e));
            } else {
                error!("Failed to write visited manifest: {}", e);
            }
        }

        if let Some(failure) = failure {
            return Err(failure);
        }

        let summary = CrawlSummary {
            saved,
            skipped,
            errors,
            visited: visited.len() as u64,
            elapsed: start.elapsed(),
            interrupted,
        };
        info!(
            "Crawl finished: saved {} skipped {} errors {} visited {} in {:.1}s",
            summary.saved,
            summary.skipped,
            summary.errors,
            summary.visited,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }
}

/// Whether this `(completed, total)` pair differs from the last one logged
///
/// Every transition is reported, including the initial `0/0` before the
/// remote job has discovered anything.
fn progress_changed(last: &mut Option<(u64, u64)>, next: (u64, u64)) -> bool {
    if *last == Some(next) {
        return false;
    }
    *last = Some(next);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::firecrawl::types::{CrawlJobSnapshot, CrawlRequest, PageMetadata, PageRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Scripted crawl API: returns canned snapshots in sequence
    struct ScriptedApi {
        snapshots: Mutex<Vec<Result<CrawlJobSnapshot>>>,
        submit_result: Result<String>,
    }

    impl ScriptedApi {
        fn new(snapshots: Vec<Result<CrawlJobSnapshot>>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots),
                submit_result: Ok("job-1".to_string()),
            }
        }

        fn failing_submit(message: &str) -> Self {
            Self {
                snapshots: Mutex::new(Vec::new()),
                submit_result: Err(Error::Crawl(message.to_string())),
            }
        }
    }

    #[async_trait]
    impl CrawlApi for ScriptedApi {
        async fn submit(&self, _request: CrawlRequest) -> Result<String> {
            match &self.submit_result {
                Ok(id) => Ok(id.clone()),
                Err(_) => Err(Error::Crawl("submission rejected".to_string())),
            }
        }

        async fn poll(&self, _job_id: &str) -> Result<CrawlJobSnapshot> {
            let mut snapshots = self.snapshots.lock().unwrap();
            if snapshots.is_empty() {
                // Script exhausted: report completion with nothing new
                return Ok(snapshot(JobStatus::Completed, &[]));
            }
            snapshots.remove(0)
        }
    }

    fn page(url: &str, markdown: &str) -> PageRecord {
        PageRecord {
            markdown: Some(markdown.to_string()),
            metadata: Some(PageMetadata {
                url: Some(url.to_string()),
                language: None,
                raw_html: None,
            }),
        }
    }

    fn snapshot(status: JobStatus, pages: &[PageRecord]) -> CrawlJobSnapshot {
        CrawlJobSnapshot {
            status,
            completed: pages.len() as u64,
            total: pages.len() as u64,
            data: pages.to_vec(),
        }
    }

    fn config(dir: &std::path::Path) -> CrawlConfig {
        CrawlConfig::builder("https://example.com")
            .unwrap()
            .output_dir(dir)
            .check_interval_secs(0)
            .build()
    }

    fn shutdown_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn test_normal_run_saves_pages_and_manifest() {
        let dir = tempdir().unwrap();
        let api = ScriptedApi::new(vec![Ok(snapshot(
            JobStatus::Completed,
            &[
                page("https://example.com/a", "# A"),
                page("https://example.com/b", "# B"),
            ],
        ))]);

        let (_tx, rx) = shutdown_pair();
        let summary = CrawlPoller::new(api, config(dir.path())).run(rx).await.unwrap();

        assert_eq!(summary.saved, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.visited, 2);
        assert!(!summary.interrupted);

        assert!(dir.path().join("a.md").exists());
        assert!(dir.path().join("b.md").exists());
        let manifest = std::fs::read_to_string(dir.path().join("visited_urls.txt")).unwrap();
        assert_eq!(manifest, "https://example.com/a\nhttps://example.com/b\n");
    }

    #[tokio::test]
    async fn test_duplicate_url_across_polls_written_once() {
        let dir = tempdir().unwrap();
        let api = ScriptedApi::new(vec![
            Ok(snapshot(
                JobStatus::Running,
                &[page("https://example.com/a", "# A")],
            )),
            Ok(snapshot(
                JobStatus::Completed,
                &[
                    page("https://example.com/a", "# A again"),
                    page("https://example.com/b", "# B"),
                ],
            )),
        ]);

        let (_tx, rx) = shutdown_pair();
        let summary = CrawlPoller::new(api, config(dir.path())).run(rx).await.unwrap();

        assert_eq!(summary.saved, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.visited, 2);
        // Counter invariant: every (url, appearance) pair is accounted for.
        assert_eq!(summary.saved + summary.skipped + summary.errors, 3);

        let content = std::fs::read_to_string(dir.path().join("a.md")).unwrap();
        assert_eq!(content, "# A");
    }

    #[tokio::test]
    async fn test_submission_failure_is_terminal() {
        let dir = tempdir().unwrap();
        let api = ScriptedApi::failing_submit("bad url");

        let (_tx, rx) = shutdown_pair();
        let err = CrawlPoller::new(api, config(dir.path())).run(rx).await.unwrap_err();

        assert!(matches!(err, CrawlError::Submission(_)));
        // No output was produced at all
        assert!(!dir.path().join("visited_urls.txt").exists());
    }

    #[tokio::test]
    async fn test_poll_failure_still_writes_manifest() {
        let dir = tempdir().unwrap();
        let api = ScriptedApi::new(vec![
            Ok(snapshot(
                JobStatus::Running,
                &[page("https://example.com/a", "# A")],
            )),
            Err(Error::Api {
                status_code: 500,
                message: "server error".to_string(),
            }),
        ]);

        let (_tx, rx) = shutdown_pair();
        let err = CrawlPoller::new(api, config(dir.path())).run(rx).await.unwrap_err();

        assert!(matches!(err, CrawlError::Poll(_)));
        let manifest = std::fs::read_to_string(dir.path().join("visited_urls.txt")).unwrap();
        assert_eq!(manifest, "https://example.com/a\n");
    }

    #[tokio::test]
    async fn test_interrupt_during_sleep_flushes_partial_progress() {
        let dir = tempdir().unwrap();
        // First poll delivers 2 of 5 expected pages; the run is interrupted
        // during the following sleep.
        let first = CrawlJobSnapshot {
            status: JobStatus::Running,
            completed: 2,
            total: 5,
            data: vec![
                page("https://example.com/a", "# A"),
                page("https://example.com/b", "# B"),
            ],
        };
        let api = ScriptedApi::new(vec![Ok(first)]);

        let config = CrawlConfig::builder("https://example.com")
            .unwrap()
            .output_dir(dir.path())
            .check_interval_secs(60)
            .build();

        let (tx, rx) = shutdown_pair();
        let handle = tokio::spawn(CrawlPoller::new(api, config).run(rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();

        let summary = handle.await.unwrap().unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.saved, 2);
        assert_eq!(summary.visited, 2);

        let manifest = std::fs::read_to_string(dir.path().join("visited_urls.txt")).unwrap();
        assert_eq!(manifest, "https://example.com/a\nhttps://example.com/b\n");
    }

    #[tokio::test]
    async fn test_record_without_url_counts_as_error() {
        let dir = tempdir().unwrap();
        let bad = PageRecord {
            markdown: Some("# orphan".to_string()),
            metadata: Some(PageMetadata::default()),
        };
        let api = ScriptedApi::new(vec![Ok(CrawlJobSnapshot {
            status: JobStatus::Completed,
            completed: 2,
            total: 2,
            data: vec![bad, page("https://example.com/a", "# A")],
        })]);

        let (_tx, rx) = shutdown_pair();
        let summary = CrawlPoller::new(api, config(dir.path())).run(rx).await.unwrap();

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.visited, 1);
    }

    #[tokio::test]
    async fn test_language_filtered_page_counts_as_skipped() {
        let dir = tempdir().unwrap();
        let es_page = PageRecord {
            markdown: Some("# Hola".to_string()),
            metadata: Some(PageMetadata {
                url: Some("https://example.com/hola".to_string()),
                language: Some("es".to_string()),
                raw_html: None,
            }),
        };
        let api = ScriptedApi::new(vec![Ok(CrawlJobSnapshot {
            status: JobStatus::Completed,
            completed: 1,
            total: 1,
            data: vec![es_page],
        })]);

        let config = CrawlConfig::builder("https://example.com")
            .unwrap()
            .output_dir(dir.path())
            .languages(["en".to_string()].into_iter().collect())
            .check_interval_secs(0)
            .build();

        let (_tx, rx) = shutdown_pair();
        let summary = CrawlPoller::new(api, config).run(rx).await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.saved, 0);
        // Filtered pages still count as visited
        assert_eq!(summary.visited, 1);
        assert!(!dir.path().join("hola.md").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_shutdown_sender_still_sleeps_between_polls() {
        let dir = tempdir().unwrap();
        let api = ScriptedApi::new(vec![
            Ok(snapshot(
                JobStatus::Running,
                &[page("https://example.com/a", "# A")],
            )),
            Ok(snapshot(JobStatus::Running, &[])),
        ]);

        let config = CrawlConfig::builder("https://example.com")
            .unwrap()
            .output_dir(dir.path())
            .check_interval_secs(60)
            .build();

        let (tx, rx) = shutdown_pair();
        drop(tx);

        let started = tokio::time::Instant::now();
        let summary = CrawlPoller::new(api, config).run(rx).await.unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.saved, 1);
        // Two running polls before completion mean two full interval sleeps;
        // a closed channel must not short-circuit them.
        assert!(started.elapsed() >= Duration::from_secs(120));
    }

    #[test]
    fn test_progress_logged_on_every_transition_including_zero() {
        let mut last = None;
        assert!(progress_changed(&mut last, (0, 0)));
        assert!(!progress_changed(&mut last, (0, 0)));
        assert!(progress_changed(&mut last, (0, 5)));
        assert!(progress_changed(&mut last, (3, 5)));
        assert!(!progress_changed(&mut last, (3, 5)));
    }
}
