//! Tool-calling coordinator for a single agent invocation
//!
//! This module drives the conversation between one agent and its model:
//!
//! 1. Send the resolved instruction with the agent's capabilities
//! 2. If the model requests tool calls, execute them one after another
//! 3. Send tool results back to the model
//! 4. Repeat until the model stops calling tools, an `exit_loop` call was
//!    made, or the round limit is reached
//!
//! Model calls are retried with exponential backoff. A reply the client
//! cannot parse ends the session like a plain empty answer. Tool failures never
//! abort the invocation; they are reported back to the model as
//! `{"status": "error"}` records.

use crate::llm::client::{LLMClient, LLMResponse, TokenUsage};
use crate::tools::registry::{ToolContext, ToolRegistry};
use crate::types::{AppError, Result, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Configuration for tool calling coordination behavior.
#[derive(Debug, Clone)]
pub struct ToolCallingConfig {
    /// Maximum number of model round-trips before stopping.
    pub max_iterations: usize,

    /// Timeout for individual tool execution.
    pub tool_timeout: Duration,

    /// Additional attempts after a failed model call.
    pub max_retries: u32,

    /// Delay before the first retry; doubled for every further attempt.
    pub retry_backoff: Duration,
}

impl Default for ToolCallingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tool_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Record of a single tool call execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Unique identifier for this tool call (from the model).
    pub id: String,
    /// Name of the tool that was called.
    pub name: String,
    /// Arguments passed to the tool.
    pub arguments: serde_json::Value,
    /// Result returned by the tool (or error object).
    pub result: serde_json::Value,
    /// Whether the tool execution was successful.
    pub success: bool,
    /// Time taken to execute the tool in milliseconds.
    pub duration_ms: u64,
    /// Error message if the tool failed.
    pub error: Option<String>,
}

/// Reason why a coordination session ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Model decided to stop (no more tool calls).
    Stop,
    /// A capability raised the loop exit signal.
    ExitRequested,
    /// Hit the maximum iterations limit.
    MaxIterations,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::ExitRequested => write!(f, "exit_requested"),
            FinishReason::MaxIterations => write!(f, "max_iterations"),
        }
    }
}

/// A message in a tool-calling conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The text content of the message.
    pub content: String,
    /// Tool calls requested by the assistant (only for Assistant role).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Id of the call a Tool message answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Role of a message sender in a tool-calling conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

impl ConversationMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message with optional tool calls.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, result: &serde_json::Value) -> Self {
        Self {
            role: MessageRole::Tool,
            content: serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Result of a complete coordination session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorResult {
    /// Final text response from the model.
    pub content: String,

    /// All tool calls made during the session.
    pub tool_calls: Vec<ToolCallRecord>,

    /// Number of model round-trips performed.
    pub iterations: usize,

    /// Why the session ended.
    pub finish_reason: FinishReason,

    /// Accumulated token usage across all iterations.
    pub total_usage: TokenUsage,

    /// Full message history.
    pub message_history: Vec<ConversationMessage>,
}

/// Drives one agent's conversation with its model.
pub struct ToolCoordinator {
    client: Arc<dyn LLMClient>,
    registry: Arc<ToolRegistry>,
    config: ToolCallingConfig,
}

impl ToolCoordinator {
    pub fn new(
        client: Arc<dyn LLMClient>,
        registry: Arc<ToolRegistry>,
        config: ToolCallingConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Execute a complete tool-calling conversation loop.
    ///
    /// `ctx` is handed to every tool call; an `exit_loop` call raises its exit
    /// flag, which ends the session after the current round.
    pub async fn execute(
        &self,
        system: Option<&str>,
        prompt: &str,
        ctx: &ToolContext,
    ) -> Result<CoordinatorResult> {
        let tools = self.registry.get_tool_definitions();
        let mut messages: Vec<ConversationMessage> = Vec::new();
        let mut all_tool_calls: Vec<ToolCallRecord> = Vec::new();
        let mut total_usage = TokenUsage::default();
        let mut last_text = String::new();

        if let Some(sys) = system {
            messages.push(ConversationMessage::system(sys));
        }
        messages.push(ConversationMessage::user(prompt));

        for iteration in 0..self.config.max_iterations {
            let response = self.call_model(&messages, &tools, ctx.agent()).await?;

            if let Some(usage) = response.usage {
                total_usage = total_usage.add(usage);
            }
            if !response.content.trim().is_empty() {
                last_text = response.content.clone();
            }

            messages.push(ConversationMessage::assistant(
                &response.content,
                response.tool_calls.clone(),
            ));

            if response.tool_calls.is_empty() {
                return Ok(CoordinatorResult {
                    content: last_text,
                    tool_calls: all_tool_calls,
                    iterations: iteration + 1,
                    finish_reason: FinishReason::Stop,
                    total_usage,
                    message_history: messages,
                });
            }

            for call in &response.tool_calls {
                let record = self.execute_single_tool(call, ctx).await;
                messages.push(ConversationMessage::tool_result(&record.id, &record.result));
                all_tool_calls.push(record);
            }

            if ctx.exit_requested() {
                return Ok(CoordinatorResult {
                    content: last_text,
                    tool_calls: all_tool_calls,
                    iterations: iteration + 1,
                    finish_reason: FinishReason::ExitRequested,
                    total_usage,
                    message_history: messages,
                });
            }
        }

        tracing::warn!(
            agent = ctx.agent(),
            rounds = self.config.max_iterations,
            "Tool-calling round limit reached"
        );

        Ok(CoordinatorResult {
            content: last_text,
            tool_calls: all_tool_calls,
            iterations: self.config.max_iterations,
            finish_reason: FinishReason::MaxIterations,
            total_usage,
            message_history: messages,
        })
    }

    /// Call the model, retrying failures with exponential backoff.
    ///
    /// A malformed reply is not retried; it counts as an empty turn.
    async fn call_model(
        &self,
        messages: &[ConversationMessage],
        tools: &[crate::types::ToolDefinition],
        agent: &str,
    ) -> Result<LLMResponse> {
        let attempts = self.config.max_retries + 1;
        let mut delay = self.config.retry_backoff;
        let mut last_error = None;

        for attempt in 1..=attempts {
            tracing::debug!(
                agent,
                model = self.client.model_name(),
                attempt,
                messages = messages.len(),
                "Querying model"
            );

            match self
                .client
                .generate_with_tools_and_history(messages, tools)
                .await
            {
                Ok(response) => {
                    tracing::debug!(
                        agent,
                        content = %response.content,
                        tool_calls = response.tool_calls.len(),
                        "Model responded"
                    );
                    return Ok(response);
                }
                Err(AppError::MalformedResponse(reason)) => {
                    tracing::warn!(agent, attempt, %reason, "Ignoring malformed model response");
                    return Ok(LLMResponse::text(""));
                }
                Err(e) => {
                    tracing::warn!(agent, attempt, error = %e, "Model call failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                        delay = delay.saturating_mul(2);
                    }
                }
            }
        }

        Err(AppError::LLM(format!(
            "model '{}' unavailable after {} attempt(s): {}",
            self.client.model_name(),
            attempts,
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string())
        )))
    }

    /// Execute a single tool call with timeout.
    ///
    /// Every outcome, including an unknown tool name, becomes a record.
    async fn execute_single_tool(&self, call: &ToolCall, ctx: &ToolContext) -> ToolCallRecord {
        let start = Instant::now();
        let arguments = if call.arguments.is_object() {
            call.arguments.clone()
        } else {
            json!({})
        };

        tracing::debug!(agent = ctx.agent(), tool = %call.name, args = %arguments, "Executing tool");

        let result = timeout(
            self.config.tool_timeout,
            self.registry.execute(&call.name, arguments.clone(), ctx),
        )
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;

        let error = match result {
            Ok(Ok(value)) => {
                return ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                    result: value,
                    success: true,
                    duration_ms,
                    error: None,
                };
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!(
                "Tool execution timed out after {}s",
                self.config.tool_timeout.as_secs()
            ),
        };

        tracing::warn!(agent = ctx.agent(), tool = %call.name, error = %error, "Tool call failed");

        ToolCallRecord {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
            result: json!({"status": "error", "error": error}),
            success: false,
            duration_ms,
            error: Some(error),
        }
    }

    pub fn client(&self) -> &dyn LLMClient {
        self.client.as_ref()
    }

    pub fn config(&self) -> &ToolCallingConfig {
        &self.config
    }
}
