//! Model provider clients and the tool-calling coordinator
//!
//! - [`LLMClient`] - the trait every provider implements
//! - [`Provider`] - runtime provider selection (Ollama or OpenAI-compatible)
//! - [`ToolCoordinator`] - drives one agent's multi-turn tool-calling session

/// Core client trait and provider selection.
pub mod client;
/// Multi-turn tool-calling loop.
pub mod coordinator;
pub mod ollama;
pub mod openai;

pub use client::{ClientOptions, LLMClient, LLMResponse, Provider, TokenUsage};
pub use coordinator::{
    ConversationMessage, CoordinatorResult, FinishReason, MessageRole, ToolCallRecord,
    ToolCallingConfig, ToolCoordinator,
};
