use crate::state::SharedState;
use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-invocation context handed to every tool call.
///
/// Carries the live state, the name of the calling agent and the exit flag
/// that `exit_loop` raises.
#[derive(Debug, Clone)]
pub struct ToolContext {
    state: SharedState,
    agent: String,
    exit: Arc<AtomicBool>,
}

impl ToolContext {
    pub fn new(state: SharedState, agent: impl Into<String>) -> Self {
        Self {
            state,
            agent: agent.into(),
            exit: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Raise the termination signal for this invocation.
    pub fn request_exit(&self) {
        self.exit.store(true, Ordering::SeqCst);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::SeqCst)
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value>;
}

/// The fixed capability set of one agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, args: Value, ctx: &ToolContext) -> Result<Value> {
        match self.tools.get(name) {
            Some(tool) => tool.execute(args, ctx).await,
            None => Err(AppError::NotFound(format!(
                "Tool not available to {}: {}",
                ctx.agent(),
                name
            ))),
        }
    }

    /// Names of all registered tools, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}
