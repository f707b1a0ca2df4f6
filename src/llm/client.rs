//! Model client abstraction and provider selection
//!
//! Every model endpoint used by the court implements [`LLMClient`]:
//! - **Ollama**: local inference through `/api/chat` with tool calling
//! - **OpenAI**: any OpenAI-compatible `/chat/completions` API

use crate::llm::coordinator::ConversationMessage;
use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Generic model client trait for provider abstraction
///
/// Agents only ever talk to a model through this trait, so tests can swap in
/// scripted clients without touching the network.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Send a conversation plus the capabilities the model may call.
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Token accounting reported by the endpoint, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Sum of two usage reports.
    pub fn add(self, other: TokenUsage) -> Self {
        Self::new(
            self.prompt_tokens + other.prompt_tokens,
            self.completion_tokens + other.completion_tokens,
        )
    }
}

/// Response from a model generation request
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<crate::types::ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    /// A plain text answer with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: None,
        }
    }
}

/// HTTP settings shared by every provider client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub temperature: f32,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    /// OpenAI API provider (including any compatible gateway)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local model provider
    ///
    /// The model must support tool calling (e.g. `llama3.1`, `qwen2.5`).
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn create_client(&self, options: &ClientOptions) -> Result<Arc<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                options,
            )?)),

            Provider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone(), options)?,
            )),
        }
    }

    /// Same provider and endpoint, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        let model = model.into();
        match self {
            Provider::OpenAI {
                api_key, api_base, ..
            } => Provider::OpenAI {
                api_key: api_key.clone(),
                api_base: api_base.clone(),
                model,
            },
            Provider::Ollama { base_url, .. } => Provider::Ollama {
                base_url: base_url.clone(),
                model,
            },
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}

pub(crate) fn build_http_client(options: &ClientOptions) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(options.request_timeout)
        .build()
        .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name() {
        let openai = Provider::OpenAI {
            api_key: "".to_string(),
            api_base: "".to_string(),
            model: "".to_string(),
        };
        assert_eq!(openai.name(), "OpenAI");

        let ollama = Provider::Ollama {
            base_url: "".to_string(),
            model: "".to_string(),
        };
        assert_eq!(ollama.name(), "Ollama");
    }

    #[test]
    fn test_with_model_keeps_endpoint() {
        let provider = Provider::Ollama {
            base_url: "http://gpu-box:11434".to_string(),
            model: "llama3.1".to_string(),
        };
        let judge = provider.with_model("qwen2.5:14b");

        assert_eq!(judge.model(), "qwen2.5:14b");
        assert!(matches!(judge, Provider::Ollama { base_url, .. } if base_url == "http://gpu-box:11434"));
    }

    #[test]
    fn test_create_client_reports_model() {
        let provider = Provider::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
        };
        let client = provider.create_client(&ClientOptions::default()).unwrap();
        assert_eq!(client.model_name(), "llama3.1");
    }

    #[test]
    fn test_token_usage_add() {
        let total = TokenUsage::new(10, 5).add(TokenUsage::new(3, 2));
        assert_eq!(total, TokenUsage::new(13, 7));
        assert_eq!(total.total_tokens, 20);
    }
}
