//! Provider: chat-completion backends
//!
//! The reasoning capability every persona call goes through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use thiserror::Error;
use tracing::{debug, trace};

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("REQUEST FAILED: {0}")]
    Request(#[from] reqwest::Error),

    #[error("UNREADABLE PAYLOAD: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BACKEND REJECTED: {0}")]
    Api(String),

    #[error("NO API KEY CONFIGURED")]
    NoApiKey,

    #[error("INVALID RESPONSE")]
    InvalidResponse,

    #[error("RATE LIMITED")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Completion returned by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }

    /// Trimmed content, or `None` when the completion carried no usable text.
    /// A completion that finished with `error` never counts as text.
    pub fn text_content(&self) -> Option<&str> {
        if self.finish_reason == "error" {
            trace!("completion finished with an error");
            return None;
        }
        let text = self.content.as_deref()?.trim();
        if text.is_empty() {
            trace!("completion carried blank content");
            None
        } else {
            Some(text)
        }
    }
}

/// Token accounting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }

}

/// Request parameters
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

impl ChatParams {
    /// Params for `model` carrying `messages`, other fields defaulted
    pub fn for_model(model: impl Into<String>, messages: Vec<Message>) -> Self {
        let params = Self {
            model: model.into(),
            messages,
            ..Default::default()
        };
        debug!(
            "chat params for {} with {} messages",
            params.model,
            params.messages.len()
        );
        params
    }
}

/// A chat-completion backend
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== ProviderError Tests ==========

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::NoApiKey;
        assert_eq!(err.to_string(), "NO API KEY CONFIGURED");

        let err = ProviderError::Api("test error".to_string());
        assert_eq!(err.to_string(), "BACKEND REJECTED: test error");

        let err = ProviderError::InvalidResponse;
        assert_eq!(err.to_string(), "INVALID RESPONSE");

        let err = ProviderError::RateLimited;
        assert_eq!(err.to_string(), "RATE LIMITED");
    }

    #[test]
    fn test_provider_error_traits() {
        fn assert_provider_error_traits<T: std::error::Error + std::fmt::Debug>() {}
        assert_provider_error_traits::<ProviderError>();
    }

    // ========== ChatResponse Tests ==========

    #[test]
    fn test_chat_response_text_builder() {
        let response = ChatResponse::text("Hello, world!");
        assert_eq!(response.content, Some("Hello, world!".to_string()));
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.usage.total_tokens, 0);
    }

    #[test]
    fn test_text_content_rejects_error_finish() {
        let response = ChatResponse {
            content: Some("upstream exploded".to_string()),
            finish_reason: "error".to_string(),
            usage: Usage::default(),
        };
        assert_eq!(response.text_content(), None);
    }

    #[test]
    fn test_text_content_trims() {
        let response = ChatResponse::text("  a plan  \n");
        assert_eq!(response.text_content(), Some("a plan"));
    }

    #[test]
    fn test_text_content_blank_is_none() {
        assert_eq!(ChatResponse::text("   \n\t").text_content(), None);

        let response = ChatResponse {
            content: None,
            finish_reason: "length".to_string(),
            usage: Usage::default(),
        };
        assert_eq!(response.text_content(), None);
    }

    // ========== Message Tests ==========

    #[test]
    fn test_message_constructors() {
        let msg = Message::system("You are the critic");
        assert_eq!(msg.role, "system");
        assert_eq!(msg.content, Some("You are the critic".to_string()));

        assert_eq!(Message::user("hi").role, "user");
    }

    #[test]
    fn test_message_serialization_skips_missing_content() {
        let msg = Message {
            role: "assistant".to_string(),
            content: None,
        };
        let json_str = serde_json::to_string(&msg).unwrap();
        assert_eq!(json_str, r#"{"role":"assistant"}"#);
    }

    #[test]
    fn test_message_deserialization() {
        let json_str = r#"{"role":"user","content":"Hi there"}"#;
        let msg: Message = serde_json::from_str(json_str).unwrap();
        assert_eq!(msg, Message::user("Hi there"));
    }

    // ========== ChatParams Tests ==========

    #[test]
    fn test_chat_params_default() {
        let params = ChatParams::default();
        assert_eq!(params.model, "");
        assert!(params.messages.is_empty());
        assert_eq!(params.max_tokens, 4096);
        assert_eq!(params.temperature, 0.7);
    }

    #[test]
    fn test_chat_params_for_model() {
        let params = ChatParams::for_model("gpt-4", vec![Message::user("Hello")]);
        assert_eq!(params.model, "gpt-4");
        assert_eq!(params.messages.len(), 1);
        assert_eq!(params.max_tokens, 4096);
    }

    #[test]
    fn test_chat_response_deserialization_defaults() {
        let response: ChatResponse = serde_json::from_str(r#"{"content":"ok"}"#).unwrap();
        assert_eq!(response.content.as_deref(), Some("ok"));
        assert_eq!(response.finish_reason, "");
        assert_eq!(response.usage.prompt_tokens, 0);
    }
}
