//! Multi-strategy search orchestration
//!
//! Three mutually exclusive strategies over the same two remote facades.
//! Failures establishing the unit of work (hint/selector derivation, the
//! initial map call) abort a strategy; failures on an individual candidate
//! are logged and skipped so one bad page never sinks the batch.

use crate::anthropic::CompletionModel;
use crate::firecrawl::{MapApi, ScrapeApi};
use crate::search::error::SearchError;
use crate::search::judge::RelevanceJudge;
use crate::search::{
    DeepResult, ExtractedPage, QuickResult, RankedPage, SearchReport, SearchStrategy,
    SelectiveResult,
};
use serde_json::Value;
use tracing::{info, warn};

/// Candidates considered by the deep strategy
const DEEP_CANDIDATES: usize = 5;

/// Candidates considered by the selective strategy
const SELECTIVE_CANDIDATES: usize = 3;

/// Composes the map and scrape facades with the relevance judge
pub struct SearchOrchestrator<M, S, C>
where
    M: MapApi,
    S: ScrapeApi,
    C: CompletionModel,
{
    map: M,
    scrape: S,
    judge: RelevanceJudge<C>,
}

impl<M, S, C> SearchOrchestrator<M, S, C>
where
    M: MapApi,
    S: ScrapeApi,
    C: CompletionModel,
{
    /// Create an orchestrator over the given facades
    pub fn new(map: M, scrape: S, model: C, max_tokens: u32) -> Self {
        Self {
            map,
            scrape,
            judge: RelevanceJudge::new(model, max_tokens),
        }
    }

    /// Run the strategy selected by the caller
    pub async fn search(
        &self,
        strategy: SearchStrategy,
        url: &str,
        objective: &str,
    ) -> Result<SearchReport, SearchError> {
        info!("Objective: {} (strategy: {:?})", objective, strategy);
        match strategy {
            SearchStrategy::Quick => self.quick(url, objective).await.map(SearchReport::Quick),
            SearchStrategy::Deep => self.deep(url, objective).await.map(SearchReport::Deep),
            SearchStrategy::Selective => self
                .selective(url, objective)
                .await
                .map(SearchReport::Selective),
        }
    }

    /// Quick strategy: one hint, one map call, one scrape
    ///
    /// Optimizes for latency over recall: only the best-ranked candidate is
    /// fetched, and its raw content is returned tagged with the hint used.
    pub async fn quick(
        &self,
        url: &str,
        objective: &str,
    ) -> Result<Option<QuickResult>, SearchError> {
        let hint = self.judge.derive_hint(objective).await?;
        info!("Mapping {} with search parameter: {}", url, hint);

        let links = self
            .map
            .map(url, Some(&hint))
            .await
            .map_err(SearchError::Map)?;

        let first = match links.first() {
            Some(first) => first,
            None => {
                info!("No candidate pages found for hint {}", hint);
                return Ok(None);
            }
        };

        match self.scrape.scrape(first).await {
            Ok(content) => Ok(Some(QuickResult {
                source_url: first.clone(),
                content,
                parameter_used: hint,
            })),
            Err(e) => {
                warn!("Failed to scrape {}: {}", first, e);
                Ok(None)
            }
        }
    }

    /// Deep strategy: judge the top candidates and rank the matches
    ///
    /// Every candidate is scraped and judged independently; matches are
    /// sorted by relevance score descending, ties keeping map order.
    pub async fn deep(&self, url: &str, objective: &str) -> Result<DeepResult, SearchError> {
        let links = self.map.map(url, None).await.map_err(SearchError::Map)?;
        info!(
            "Analyzing top {} of {} candidate pages",
            links.len().min(DEEP_CANDIDATES),
            links.len()
        );

        let mut total_analyzed = 0;
        let mut results = Vec::new();

        for candidate in links.iter().take(DEEP_CANDIDATES) {
            let content = match self.scrape.scrape(candidate).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to scrape {}: {}; skipping", candidate, e);
                    continue;
                }
            };
            total_analyzed += 1;

            match self.judge.judge_ranked(objective, &content).await {
                Ok(Some(judgment)) if judgment.matches_objective => {
                    results.push(RankedPage {
                        url: candidate.clone(),
                        content,
                        relevance_score: judgment.relevance_score,
                        key_points: judgment.key_points,
                        matches_objective: judgment.matches_objective,
                    });
                }
                Ok(_) => info!("Objective not met on {}", candidate),
                Err(e) => warn!("Failed to judge {}: {}; skipping", candidate, e),
            }
        }

        // Stable sort: equal scores keep their map order
        results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

        Ok(DeepResult {
            results,
            total_analyzed,
        })
    }

    /// Selective strategy: extract model-derived selectors from candidates
    pub async fn selective(
        &self,
        url: &str,
        objective: &str,
    ) -> Result<SelectiveResult, SearchError> {
        let selectors = self.judge.derive_selectors(objective).await?;
        info!("Derived {} selectors", selectors.len());

        let links = self.map.map(url, None).await.map_err(SearchError::Map)?;

        let mut results = Vec::new();
        for candidate in links.iter().take(SELECTIVE_CANDIDATES) {
            match self.scrape.extract(candidate, &selectors).await {
                Ok(content) => results.push(ExtractedPage {
                    url: candidate.clone(),
                    content,
                }),
                Err(e) => warn!("Failed to extract from {}: {}; skipping", candidate, e),
            }
        }

        Ok(SelectiveResult {
            selectors_used: selectors,
            results,
        })
    }

    /// Single-page analysis: scrape one URL and structure its content
    pub async fn analyze(&self, url: &str) -> Result<Value, SearchError> {
        let content = self.scrape.scrape(url).await.map_err(SearchError::Scrape)?;
        self.judge.extract_structured(&content).await
    }

    /// Analyze several pages sequentially
    ///
    /// Failures on an individual URL are logged and skipped, same as the
    /// per-candidate policy of the batch strategies.
    pub async fn analyze_batch(&self, urls: &[String]) -> Vec<ExtractedPage> {
        let mut results = Vec::new();
        for url in urls {
            match self.analyze(url).await {
                Ok(content) => results.push(ExtractedPage {
                    url: url.clone(),
                    content,
                }),
                Err(e) => warn!("Failed to analyze {}: {}; skipping", url, e),
            }
        }
        results
    }
}
