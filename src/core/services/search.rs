//! Search client contract consumed by the commands
//!
//! Query structs list their formal parameter names in `PARAMETERS`; command
//! handlers use that list to pick the service arguments out of everything the
//! user supplied.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_region() -> String {
    "wt-wt".to_string()
}

fn default_safesearch() -> String {
    "moderate".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TextQuery {
    pub keywords: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_safesearch")]
    pub safesearch: String,
    #[serde(default)]
    pub timelimit: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl TextQuery {
    pub const PARAMETERS: &'static [&'static str] =
        &["keywords", "region", "safesearch", "timelimit", "max_results"];
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ImagesQuery {
    pub keywords: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_safesearch")]
    pub safesearch: String,
    #[serde(default)]
    pub timelimit: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub type_image: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub license_image: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl ImagesQuery {
    pub const PARAMETERS: &'static [&'static str] = &[
        "keywords",
        "region",
        "safesearch",
        "timelimit",
        "size",
        "color",
        "type_image",
        "layout",
        "license_image",
        "max_results",
    ];

    pub fn new(keywords: &str) -> Self {
        Self {
            keywords: keywords.to_string(),
            region: default_region(),
            safesearch: default_safesearch(),
            timelimit: None,
            size: None,
            color: None,
            type_image: None,
            layout: None,
            license_image: None,
            max_results: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewsQuery {
    pub keywords: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_safesearch")]
    pub safesearch: String,
    #[serde(default)]
    pub timelimit: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl NewsQuery {
    pub const PARAMETERS: &'static [&'static str] =
        &["keywords", "region", "safesearch", "timelimit", "max_results"];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResult {
    pub title: String,
    pub image: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub width: u64,
    #[serde(default)]
    pub source: String,
}

impl ImageResult {
    pub fn from_url(image: &str) -> Self {
        Self {
            title: String::new(),
            image: image.to_string(),
            thumbnail: String::new(),
            url: String::new(),
            height: 0,
            width: 0,
            source: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsResult {
    pub date: String,
    pub title: String,
    pub body: String,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub source: String,
}

/// Lazy, single-pass sequence of image results
pub type ImageStream<'a> = BoxStream<'a, Result<ImageResult>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// Conversation state owned by a chat client; also the on-disk cache record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    /// Server-issued session token
    #[serde(default)]
    pub vqd: Option<String>,
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Rough token estimate used for the running usage counter
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    (chars / 4).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatModel {
    Gpt4oMini,
    Claude3Haiku,
    Llama31_70b,
    Mixtral8x7b,
}

impl ChatModel {
    /// Supported models in menu order; users pick them by 1-based index
    pub const ALL: [ChatModel; 4] = [
        ChatModel::Gpt4oMini,
        ChatModel::Claude3Haiku,
        ChatModel::Llama31_70b,
        ChatModel::Mixtral8x7b,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatModel::Gpt4oMini => "gpt-4o-mini",
            ChatModel::Claude3Haiku => "claude-3-haiku",
            ChatModel::Llama31_70b => "llama-3.1-70b",
            ChatModel::Mixtral8x7b => "mixtral-8x7b",
        }
    }

    /// Identifier expected by the chat endpoint
    pub fn api_id(&self) -> &'static str {
        match self {
            ChatModel::Gpt4oMini => "gpt-4o-mini",
            ChatModel::Claude3Haiku => "claude-3-haiku-20240307",
            ChatModel::Llama31_70b => "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
            ChatModel::Mixtral8x7b => "mistralai/Mixtral-8x7B-Instruct-v0.1",
        }
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn text(&self, query: &TextQuery) -> Result<Vec<TextResult>>;

    fn images(&self, query: ImagesQuery) -> ImageStream<'_>;

    async fn news(&self, query: &NewsQuery) -> Result<Vec<NewsResult>>;

    /// One chat exchange. On success the session state contains the user
    /// message followed by the reply.
    async fn chat(&mut self, keywords: &str, model: ChatModel, timeout: Duration) -> Result<String>;

    fn session_state(&self) -> SessionState;

    fn set_session_state(&mut self, state: SessionState);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_selection_by_index() {
        assert_eq!(ChatModel::from_index(1), Some(ChatModel::Gpt4oMini));
        assert_eq!(ChatModel::from_index(4), Some(ChatModel::Mixtral8x7b));
        assert_eq!(ChatModel::from_index(0), None);
        assert_eq!(ChatModel::from_index(5), None);
        assert_eq!(ChatModel::Claude3Haiku.name(), "claude-3-haiku");
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("hi"), 1);
        assert_eq!(estimate_tokens("twelve chars"), 3);
    }

    #[test]
    fn test_session_state_tolerates_missing_fields() {
        let state: SessionState = serde_json::from_str(r#"{"vqd": "abc"}"#).unwrap();
        assert_eq!(state.vqd.as_deref(), Some("abc"));
        assert_eq!(state.tokens, 0);
        assert!(state.messages.is_empty());
    }
}
