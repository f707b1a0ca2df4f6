//! Model-backed leaf agent
//!
//! An [`LlmAgent`] owns an instruction template, a model client and a fixed
//! capability set. Each run resolves the template against the invocation's
//! read view and hands the conversation to a [`ToolCoordinator`].

use crate::agents::{Agent, AgentOutput, InvocationContext};
use crate::llm::{FinishReason, LLMClient, ToolCallingConfig, ToolCoordinator};
use crate::state::render_template;
use crate::tools::registry::{Tool, ToolContext, ToolRegistry};
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_KICKOFF: &str = "Begin your task for the topic: { TOPIC? }";

pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    kickoff: String,
    client: Arc<dyn LLMClient>,
    tools: ToolRegistry,
    tool_config: ToolCallingConfig,
    output_key: Option<String>,
}

impl LlmAgent {
    pub fn new(name: impl Into<String>, client: Arc<dyn LLMClient>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            kickoff: DEFAULT_KICKOFF.to_string(),
            client,
            tools: ToolRegistry::new(),
            tool_config: ToolCallingConfig::default(),
            output_key: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// System instruction; may contain `{ KEY? }` placeholders.
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Opening user message; resolved like the instruction.
    pub fn kickoff(mut self, kickoff: impl Into<String>) -> Self {
        self.kickoff = kickoff.into();
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tool_config(mut self, config: ToolCallingConfig) -> Self {
        self.tool_config = config;
        self
    }

    /// Store non-empty final text under `key` as a control value.
    pub fn output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.tool_names()
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<AgentOutput> {
        let instruction = render_template(&self.instruction, ctx.read_view());
        let kickoff = render_template(&self.kickoff, ctx.read_view());

        tracing::info!(agent = %self.name, model = self.client.model_name(), "Agent started");

        let tool_ctx = ToolContext::new(ctx.state().clone(), self.name.clone());
        let coordinator = ToolCoordinator::new(
            self.client.clone(),
            Arc::new(self.tools.clone()),
            self.tool_config.clone(),
        );

        let result = coordinator
            .execute(Some(&instruction), &kickoff, &tool_ctx)
            .await
            .map_err(|e| e.within(&self.name))?;

        if let Some(key) = &self.output_key {
            if !result.content.trim().is_empty() {
                ctx.state()
                    .set(key, result.content.clone())
                    .map_err(|e| e.within(&self.name))?;
            }
        }

        let exit_requested =
            result.finish_reason == FinishReason::ExitRequested || tool_ctx.exit_requested();

        tracing::info!(
            agent = %self.name,
            rounds = result.iterations,
            tool_calls = result.tool_calls.len(),
            exit_requested,
            "Agent finished"
        );

        Ok(AgentOutput {
            agent: self.name.clone(),
            content: result.content,
            exit_requested,
            tool_calls: result.tool_calls,
            usage: result.total_usage,
            loop_summary: None,
            children: Vec::new(),
        })
    }
}
