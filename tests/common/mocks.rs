//! Mock implementations for testing.
//!
//! Scripted model clients and search backends that can be used across
//! different test files without duplication.

use async_trait::async_trait;
use court::llm::{ConversationMessage, LLMClient, LLMResponse, MessageRole};
use court::tools::SearchBackend;
use court::types::{AppError, Result, ToolCall, ToolDefinition};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

/// Model client that replays a fixed queue of responses.
///
/// Once the queue is drained every further call returns the fallback, an
/// empty text answer unless overridden. The system prompt of every call is
/// recorded so tests can check template resolution.
pub struct ScriptedLLMClient {
    name: String,
    script: Mutex<VecDeque<LLMResponse>>,
    fallback: Option<LLMResponse>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLLMClient {
    pub fn new(name: &str, script: Vec<LLMResponse>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            fallback: Some(LLMResponse::text("")),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fallback(mut self, fallback: LLMResponse) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Fail every call once the script is drained.
    pub fn failing_after_script(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// System prompts seen so far, one per model call.
    pub fn system_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl LLMClient for ScriptedLLMClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let system = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().push(system);

        if let Some(next) = self.script.lock().pop_front() {
            return Ok(next);
        }
        self.fallback
            .clone()
            .ok_or_else(|| AppError::LLM(format!("{} script exhausted", self.name)))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// A response asking for one tool call.
pub fn tool_call(name: &str, arguments: Value) -> LLMResponse {
    LLMResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: "tool_calls".to_string(),
        usage: None,
    }
}

/// Search backend that answers every query with the same text.
pub struct StaticSearch(pub String);

impl StaticSearch {
    pub fn new(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[async_trait]
impl SearchBackend for StaticSearch {
    async fn search(&self, query: &str) -> Result<String> {
        Ok(format!("Page: {}\nSummary: {}", query, self.0))
    }
}

/// Search backend whose every query fails, as when Wikipedia is unreachable.
pub struct FailingSearch;

#[async_trait]
impl SearchBackend for FailingSearch {
    async fn search(&self, _query: &str) -> Result<String> {
        Err(AppError::Tool("HTTP request failed: connection refused".to_string()))
    }
}
