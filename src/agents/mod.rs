//! Agents and their composition
//!
//! Leaf agents ([`LlmAgent`]) talk to a model; composites run other agents:
//! - [`ParallelGroup`] - members run concurrently against one pinned snapshot
//! - [`IterationLoop`] - ordered sub-units repeated until exit signal or cap
//! - [`Pipeline`] - ordered stages run strictly one after another
//!
//! All of them implement [`Agent`], so they nest freely. The [`Controller`]
//! seeds the topic and runs the outermost unit.

pub mod controller;
pub mod llm_agent;
pub mod loop_agent;
pub mod parallel;
pub mod sequential;

use crate::llm::{TokenUsage, ToolCallRecord};
use crate::state::template::StateView;
use crate::state::{SharedState, StateSnapshot};
use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use controller::{Controller, RunReport};
pub use llm_agent::LlmAgent;
pub use loop_agent::{ExitGuard, IterationLoop};
pub use parallel::ParallelGroup;
pub use sequential::Pipeline;

/// Base trait for all agents, leaf and composite.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique name, used in logs and error paths.
    fn name(&self) -> &str;

    /// Run once against the invocation context.
    async fn run(&self, ctx: &InvocationContext) -> Result<AgentOutput>;
}

/// Cooperative cancellation shared between the host and the loop.
///
/// Checked by [`IterationLoop`] between passes only.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What an agent sees when invoked.
///
/// Writes always go to the live store. Reads (template resolution) go to the
/// pinned snapshot when one is set, else to the live store.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    state: SharedState,
    pinned: Option<Arc<StateSnapshot>>,
    cancellation: CancellationFlag,
}

impl InvocationContext {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            pinned: None,
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Same context, reading from `snapshot`.
    pub fn pinned(&self, snapshot: Arc<StateSnapshot>) -> Self {
        Self {
            state: self.state.clone(),
            pinned: Some(snapshot),
            cancellation: self.cancellation.clone(),
        }
    }

    /// Same context, reading from the live store.
    pub fn live(&self) -> Self {
        Self {
            state: self.state.clone(),
            pinned: None,
            cancellation: self.cancellation.clone(),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn read_view(&self) -> &dyn StateView {
        match &self.pinned {
            Some(snapshot) => snapshot.as_ref() as &dyn StateView,
            None => &self.state as &dyn StateView,
        }
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }
}

/// How an [`IterationLoop`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopTermination {
    /// A sub-unit raised the exit signal.
    Signal,
    /// `max_iterations` passes completed.
    Cap,
    /// The host cancelled between passes.
    Cancelled,
}

impl std::fmt::Display for LoopTermination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopTermination::Signal => write!(f, "exit signal"),
            LoopTermination::Cap => write!(f, "iteration cap"),
            LoopTermination::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSummary {
    /// Completed or signalled passes.
    pub passes: usize,
    pub termination: LoopTermination,
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOutput {
    pub agent: String,
    /// Final text (last stage for composites).
    pub content: String,
    /// The termination signal, as raised by `exit_loop` or a member.
    pub exit_requested: bool,
    /// Capability calls made by this agent itself.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Token usage, including all children.
    pub usage: TokenUsage,
    /// Set by iteration loops.
    pub loop_summary: Option<LoopSummary>,
    /// Outputs of nested agents, in run order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AgentOutput>,
}

impl AgentOutput {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            ..Default::default()
        }
    }

    /// Record a nested output, summing its usage into this one.
    pub fn push_child(&mut self, child: AgentOutput) {
        self.usage = self.usage.add(child.usage);
        self.children.push(child);
    }

    /// Every capability call in this tree, paired with the calling agent.
    pub fn all_tool_calls(&self) -> Vec<(&str, &ToolCallRecord)> {
        let mut calls: Vec<(&str, &ToolCallRecord)> = self
            .tool_calls
            .iter()
            .map(|record| (self.agent.as_str(), record))
            .collect();
        for child in &self.children {
            calls.extend(child.all_tool_calls());
        }
        calls
    }

    /// The first loop summary found, depth-first.
    pub fn find_loop_summary(&self) -> Option<LoopSummary> {
        self.loop_summary
            .or_else(|| self.children.iter().find_map(AgentOutput::find_loop_summary))
    }

    /// Number of runs of the agent called `name` in this tree.
    pub fn count_runs(&self, name: &str) -> usize {
        let own = usize::from(self.agent == name);
        own + self
            .children
            .iter()
            .map(|child| child.count_runs(name))
            .sum::<usize>()
    }
}
