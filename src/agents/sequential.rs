use crate::agents::{Agent, AgentOutput, InvocationContext};
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs its stages strictly in order against the same state.
///
/// A stage error aborts the pipeline. Exit requests from stages are passed
/// up unchanged so a pipeline nested in a loop can still end it.
pub struct Pipeline {
    name: String,
    stages: Vec<Arc<dyn Agent>>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, agent: Arc<dyn Agent>) -> Self {
        self.stages.push(agent);
        self
    }
}

#[async_trait]
impl Agent for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<AgentOutput> {
        let live = ctx.live();
        let mut output = AgentOutput::new(self.name.clone());

        for (index, stage) in self.stages.iter().enumerate() {
            tracing::info!(
                pipeline = %self.name,
                stage = stage.name(),
                step = index + 1,
                of = self.stages.len(),
                "Running stage"
            );

            let stage_output = stage.run(&live).await.map_err(|e| e.within(&self.name))?;
            output.exit_requested |= stage_output.exit_requested;
            output.content = stage_output.content.clone();
            output.push_child(stage_output);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;
    use crate::types::AppError;

    struct Step(&'static str, bool);

    #[async_trait]
    impl Agent for Step {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, ctx: &InvocationContext) -> Result<AgentOutput> {
            if self.1 {
                return Err(AppError::Persist("disk full".to_string()).within(self.0));
            }
            ctx.state().append("order", self.0)?;
            let mut output = AgentOutput::new(self.0);
            output.content = format!("{} done", self.0);
            Ok(output)
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let state = SharedState::new();
        let pipeline = Pipeline::new("historical_court_system")
            .stage(Arc::new(Step("trial_review_loop", false)))
            .stage(Arc::new(Step("verdict_agent", false)));

        let output = pipeline.run(&InvocationContext::new(state.clone())).await.unwrap();
        assert_eq!(state.get_list("order"), vec!["trial_review_loop", "verdict_agent"]);
        assert_eq!(output.content, "verdict_agent done");
        assert_eq!(output.children.len(), 2);
    }

    #[tokio::test]
    async fn test_stage_error_aborts() {
        let state = SharedState::new();
        let pipeline = Pipeline::new("historical_court_system")
            .stage(Arc::new(Step("trial_review_loop", true)))
            .stage(Arc::new(Step("verdict_agent", false)));

        let err = pipeline
            .run(&InvocationContext::new(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(
            err.agent_path(),
            Some("historical_court_system > trial_review_loop")
        );
        assert_eq!(state.len("order"), 0);
    }
}
