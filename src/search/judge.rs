//! Relevance judgment and prompt templates
//!
//! Every model interaction in the search pipeline goes through here: hint
//! and selector derivation, per-page relevance judgment, and whole-page
//! structured extraction. Responses are parsed at this boundary; a response
//! that is neither the not-met sentinel nor valid JSON is a recoverable
//! parse failure, logged and treated as "not met".

use crate::anthropic::CompletionModel;
use crate::search::error::SearchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Upper bound on page content sent to the model, in characters
///
/// The remote model has a context-size limit; longer pages are truncated
/// before transmission.
pub const MAX_CONTENT_CHARS: usize = 199_000;

/// Literal response signaling that a page does not satisfy the objective
const NOT_MET_SENTINEL: &str = "Objective not met";

/// Token budget for judgment responses
const JUDGMENT_MAX_TOKENS: u32 = 1000;

const HINT_SYSTEM: &str = "You are an expert web crawler. Respond with the BEST search parameter.";

const JUDGE_SYSTEM: &str =
    "You are an expert web crawler. Respond with the relevant information in JSON format.";

const SELECTOR_SYSTEM: &str =
    "You are an expert at CSS selectors. Output ONLY a valid JSON object with NO additional text.";

const EXTRACT_SYSTEM: &str = "You are an EXPERT at extracting and structuring webpage content. \
     Output ONLY valid, properly ESCAPED JSON with NO additional text.";

/// Outcome of a single relevance judgment
#[derive(Debug, Clone, PartialEq)]
pub enum Judgment {
    /// The objective is met; the extracted information as flat JSON
    Matched(Value),
    /// The objective is not met, or the response was unusable
    NotMet,
}

/// Parsed judgment for the deep-search variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedJudgment {
    /// How relevant the page is to the objective, 0-100
    pub relevance_score: u8,

    /// Salient points the model found on the page
    pub key_points: Vec<String>,

    /// Whether the page satisfies the objective
    pub matches_objective: bool,
}

/// Wraps the model with the fixed search-pipeline prompts
pub struct RelevanceJudge<C: CompletionModel> {
    model: C,
    max_tokens: u32,
}

impl<C: CompletionModel> RelevanceJudge<C> {
    /// Create a judge over the given model
    pub fn new(model: C, max_tokens: u32) -> Self {
        Self { model, max_tokens }
    }

    /// Derive a 1-2 word search hint from the objective
    ///
    /// The hint is treated as an opaque string: whatever the model returns
    /// is trimmed and passed through to the map call unvalidated.
    pub async fn derive_hint(&self, objective: &str) -> Result<String, SearchError> {
        let prompt = format!(
            "The map function generates a list of URLs from a website and it accepts \
             a search parameter. Based on the objective of: {}, come up with a 1-2 word \
             search parameter that will help us find the information we need. \
             Only respond with 1-2 words nothing else.",
            objective
        );

        let response = self
            .model
            .complete(HINT_SYSTEM, &prompt, self.max_tokens)
            .await
            .map_err(SearchError::Model)?;

        let hint = response.trim().to_string();
        debug!("Derived search hint: {}", hint);
        Ok(hint)
    }

    /// Derive a field-name to CSS-selector mapping from the objective
    ///
    /// Unlike judgment parsing, a malformed response here is fatal to the
    /// strategy: no extraction is meaningful without selectors.
    pub async fn derive_selectors(
        &self,
        objective: &str,
    ) -> Result<BTreeMap<String, String>, SearchError> {
        let prompt = format!(
            "Based on the objective of: {}, produce a JSON object mapping short field \
             names to the CSS selectors most likely to locate that information on a page. \
             Example: {{\"title\": \"h1\", \"price\": \".pricing-table .amount\"}}. \
             Respond with the JSON object only, no explanations.",
            objective
        );

        let response = self
            .model
            .complete(SELECTOR_SYSTEM, &prompt, self.max_tokens)
            .await
            .map_err(SearchError::Model)?;

        serde_json::from_str(response.trim())
            .map_err(|e| SearchError::Parse(format!("selector mapping was not valid JSON: {}", e)))
    }

    /// Judge whether page content satisfies the objective
    pub async fn judge(&self, objective: &str, content: &str) -> Result<Judgment, SearchError> {
        let prompt = format!(
            "Given the following scraped content and objective, determine if the \
             objective is met.\n\
             If it is, extract the relevant information in a simple and concise JSON \
             format. Use only the necessary fields and avoid nested structures if \
             possible.\n\
             If the objective is not met with confidence, respond with '{}'.\n\n\
             Objective: {}\n\
             Scraped content: {}\n\n\
             Remember:\n\
             1. Only return JSON if you are confident the objective is fully met.\n\
             2. Keep the JSON structure as simple and flat as possible.\n\
             3. Do not include any explanations or markdown formatting in your response.",
            NOT_MET_SENTINEL,
            objective,
            truncate(content)
        );

        let response = self
            .model
            .complete(JUDGE_SYSTEM, &prompt, JUDGMENT_MAX_TOKENS)
            .await
            .map_err(SearchError::Model)?;

        let text = response.trim();
        if text == NOT_MET_SENTINEL {
            return Ok(Judgment::NotMet);
        }

        match serde_json::from_str(text) {
            Ok(value) => Ok(Judgment::Matched(value)),
            Err(e) => {
                warn!("Judgment response was not valid JSON ({}); treating as not met", e);
                Ok(Judgment::NotMet)
            }
        }
    }

    /// Judge page content for the deep-search variant, with a 0-100 score
    ///
    /// Returns `None` for the not-met sentinel and for any response missing
    /// the expected fields.
    pub async fn judge_ranked(
        &self,
        objective: &str,
        content: &str,
    ) -> Result<Option<RankedJudgment>, SearchError> {
        let prompt = format!(
            "Given the following scraped content and objective, rate how well the \
             content satisfies the objective.\n\
             Respond with a JSON object of exactly this shape:\n\
             {{\"relevance_score\": 0-100, \"key_points\": [\"...\"], \
             \"matches_objective\": true|false}}\n\
             If the content is entirely unrelated, respond with '{}'.\n\n\
             Objective: {}\n\
             Scraped content: {}\n\n\
             Do not include any explanations or markdown formatting in your response.",
            NOT_MET_SENTINEL,
            objective,
            truncate(content)
        );

        let response = self
            .model
            .complete(JUDGE_SYSTEM, &prompt, JUDGMENT_MAX_TOKENS)
            .await
            .map_err(SearchError::Model)?;

        let text = response.trim();
        if text == NOT_MET_SENTINEL {
            return Ok(None);
        }

        match serde_json::from_str::<RankedJudgment>(text) {
            Ok(judgment) => Ok(Some(judgment)),
            Err(e) => {
                warn!("Ranked judgment was malformed ({}); treating as not met", e);
                Ok(None)
            }
        }
    }

    /// Extract the main content of a page as structured JSON
    pub async fn extract_structured(&self, content: &str) -> Result<Value, SearchError> {
        let prompt = format!(
            "You are tasked with extracting and structuring the main content from \
             this webpage VERBATIM.\n\n\
             REQUIREMENTS:\n\
             1. Return a JSON object with EXACTLY this structure:\n\
             {{\n\
                 \"title\": \"Main page title\",\n\
                 \"description\": \"Brief description or summary if available\",\n\
                 \"content\": \"Main content in PROPER MARKDOWN format\",\n\
                 \"metadata\": {{\n\
                     \"last_updated\": \"Update date ONLY IF FOUND IN THE PAGE\",\n\
                     \"author\": \"Author ONLY IF FOUND IN THE PAGE\",\n\
                     \"reading_time\": \"Estimated reading time in minutes\"\n\
                 }}\n\
             }}\n\n\
             2. Content Cleanup:\n\
             - REMOVE all navigation elements, headers, footers, ads, and non-content\n\
             - PRESERVE all important headings, lists, and markdown formatting\n\
             - ONLY include metadata fields that are explicitly present in the content\n\n\
             3. Response Format:\n\
             - Output ONLY the valid JSON object\n\
             - NO explanations or additional text\n\
             - NO markdown code blocks or formatting\n\n\
             Here is the webpage content:\n{}",
            truncate(content)
        );

        let response = self
            .model
            .complete(EXTRACT_SYSTEM, &prompt, self.max_tokens)
            .await
            .map_err(SearchError::Model)?;

        serde_json::from_str(response.trim())
            .map_err(|e| SearchError::Parse(format!("extraction response was not valid JSON: {}", e)))
    }
}

/// Bound content to the model's context budget
fn truncate(content: &str) -> &str {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((index, _)) => &content[..index],
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fake model returning a fixed response and recording prompts
    struct CannedModel {
        response: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for CannedModel {
        async fn complete(&self, _system: &str, prompt: &str, _max_tokens: u32) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_sentinel_is_not_met() {
        let judge = RelevanceJudge::new(CannedModel::new("Objective not met"), 8192);
        let judgment = judge.judge("pricing", "# content").await.unwrap();
        assert_eq!(judgment, Judgment::NotMet);
    }

    #[tokio::test]
    async fn test_valid_json_is_matched() {
        let judge = RelevanceJudge::new(CannedModel::new(r#"{"price": "$10/mo"}"#), 8192);
        let judgment = judge.judge("pricing", "# content").await.unwrap();
        match judgment {
            Judgment::Matched(value) => assert_eq!(value["price"], "$10/mo"),
            Judgment::NotMet => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn test_garbage_response_is_recoverable_not_met() {
        let judge = RelevanceJudge::new(CannedModel::new("Sure! Here's what I found..."), 8192);
        let judgment = judge.judge("pricing", "# content").await.unwrap();
        assert_eq!(judgment, Judgment::NotMet);
    }

    #[tokio::test]
    async fn test_ranked_judgment_parses_expected_shape() {
        let response = r#"{"relevance_score": 85, "key_points": ["has plans"], "matches_objective": true}"#;
        let judge = RelevanceJudge::new(CannedModel::new(response), 8192);
        let judgment = judge.judge_ranked("pricing", "# content").await.unwrap().unwrap();

        assert_eq!(judgment.relevance_score, 85);
        assert!(judgment.matches_objective);
        assert_eq!(judgment.key_points, vec!["has plans".to_string()]);
    }

    #[tokio::test]
    async fn test_ranked_judgment_missing_fields_is_not_met() {
        let judge = RelevanceJudge::new(CannedModel::new(r#"{"relevance_score": 85}"#), 8192);
        let judgment = judge.judge_ranked("pricing", "# content").await.unwrap();
        assert!(judgment.is_none());
    }

    #[tokio::test]
    async fn test_hint_is_trimmed_but_otherwise_opaque() {
        let judge = RelevanceJudge::new(CannedModel::new("  pricing plans \n"), 8192);
        let hint = judge.derive_hint("find me the pricing plans").await.unwrap();
        assert_eq!(hint, "pricing plans");

        // A malformed multi-word hint passes through untouched
        let judge = RelevanceJudge::new(
            CannedModel::new("I think you should search for pricing"),
            8192,
        );
        let hint = judge.derive_hint("find me the pricing plans").await.unwrap();
        assert_eq!(hint, "I think you should search for pricing");
    }

    #[tokio::test]
    async fn test_selector_derivation_requires_json() {
        let judge = RelevanceJudge::new(CannedModel::new("not json"), 8192);
        let err = judge.derive_selectors("pricing").await.unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));

        let judge = RelevanceJudge::new(CannedModel::new(r#"{"title": "h1"}"#), 8192);
        let selectors = judge.derive_selectors("pricing").await.unwrap();
        assert_eq!(selectors.get("title").map(String::as_str), Some("h1"));
    }

    #[tokio::test]
    async fn test_overlong_content_truncated_before_transmission() {
        let model = CannedModel::new("Objective not met");
        let judge = RelevanceJudge::new(model, 8192);

        let content = "x".repeat(MAX_CONTENT_CHARS + 50_000);
        judge.judge("pricing", &content).await.unwrap();

        let prompts = judge.model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        // Prompt holds the capped content plus the fixed template text
        assert!(prompts[0].len() < MAX_CONTENT_CHARS + 2_000);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let content = "é".repeat(MAX_CONTENT_CHARS + 10);
        let truncated = truncate(&content);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS);
    }
}
