//! Request and response structures for the Anthropic messages API

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/messages`
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    /// Model identifier
    pub model: String,

    /// Token budget for the generated response
    pub max_tokens: u32,

    /// Sampling temperature; always 0 here for deterministic output
    pub temperature: f32,

    /// System instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Conversation turns; a single user turn for this crate
    pub messages: Vec<Message>,
}

/// One conversation turn
#[derive(Debug, Serialize)]
pub struct Message {
    /// Turn role, `user` or `assistant`
    pub role: String,

    /// Turn text
    pub content: String,
}

/// Response body for `POST /v1/messages`
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    /// Generated content blocks
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One block of generated content
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    /// Block kind, `text` for everything this crate requests
    #[serde(rename = "type", default)]
    pub block_type: String,

    /// Generated text
    #[serde(default)]
    pub text: String,
}

impl MessagesResponse {
    /// Concatenated text of all content blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|block| block.text.as_str())
            .collect()
    }
}
