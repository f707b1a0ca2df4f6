use crate::agents::{Agent, AgentOutput, InvocationContext, LoopSummary, LoopTermination};
use crate::state::StateSnapshot;
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Decides whether a raised exit signal is honoured, given the live state.
pub type ExitGuard = Arc<dyn Fn(&StateSnapshot) -> bool + Send + Sync>;

/// Repeats its sub-units in order until one signals exit or the cap is hit.
///
/// A pass is one run of every sub-unit. When a sub-unit's output carries
/// `exit_requested`, the rest of that pass is skipped and the loop ends.
/// The exit request is consumed here and never reported further up.
pub struct IterationLoop {
    name: String,
    sub_agents: Vec<Arc<dyn Agent>>,
    max_iterations: usize,
    guard: Option<ExitGuard>,
}

impl IterationLoop {
    /// `max_iterations` below 1 is raised to 1.
    pub fn new(name: impl Into<String>, max_iterations: usize) -> Self {
        Self {
            name: name.into(),
            sub_agents: Vec::new(),
            max_iterations: max_iterations.max(1),
            guard: None,
        }
    }

    pub fn sub_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.sub_agents.push(agent);
        self
    }

    /// Only honour exit signals for which `guard` returns true.
    pub fn with_exit_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&StateSnapshot) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn exit_allowed(&self, ctx: &InvocationContext) -> bool {
        match &self.guard {
            Some(guard) => guard(&ctx.state().snapshot()),
            None => true,
        }
    }
}

#[async_trait]
impl Agent for IterationLoop {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<AgentOutput> {
        let live = ctx.live();
        let mut output = AgentOutput::new(self.name.clone());
        let mut passes = 0;

        let termination = 'passes: loop {
            tracing::info!(
                loop_name = %self.name,
                pass = passes + 1,
                max = self.max_iterations,
                "Starting pass"
            );

            for sub_agent in &self.sub_agents {
                let sub_output = sub_agent
                    .run(&live)
                    .await
                    .map_err(|e| e.within(&self.name))?;
                let exit_requested = sub_output.exit_requested;
                output.content = sub_output.content.clone();
                output.push_child(sub_output);

                if exit_requested {
                    if self.exit_allowed(&live) {
                        passes += 1;
                        break 'passes LoopTermination::Signal;
                    }
                    tracing::warn!(
                        loop_name = %self.name,
                        agent = sub_agent.name(),
                        "Exit signal rejected by guard, continuing"
                    );
                }
            }

            passes += 1;
            if passes >= self.max_iterations {
                break LoopTermination::Cap;
            }
            if live.cancellation().is_cancelled() {
                break LoopTermination::Cancelled;
            }
        };

        tracing::info!(loop_name = %self.name, passes, %termination, "Loop finished");

        output.loop_summary = Some(LoopSummary {
            passes,
            termination,
        });
        Ok(output)
    }
}
