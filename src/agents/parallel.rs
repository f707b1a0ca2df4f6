use crate::agents::{Agent, AgentOutput, InvocationContext};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Runs its members concurrently and waits for all of them.
///
/// Members read from one snapshot pinned at group start and write through
/// their capabilities into the live store. A failing member counts as a pass
/// with no contribution; the group fails only when every member fails.
pub struct ParallelGroup {
    name: String,
    members: Vec<Arc<dyn Agent>>,
}

impl ParallelGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, agent: Arc<dyn Agent>) -> Self {
        self.members.push(agent);
        self
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name())
    }
}

#[async_trait]
impl Agent for ParallelGroup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<AgentOutput> {
        let snapshot = Arc::new(ctx.state().snapshot());
        let member_ctx = ctx.pinned(snapshot);

        tracing::info!(group = %self.name, members = self.members.len(), "Parallel group started");

        let mut set = JoinSet::new();
        for (index, member) in self.members.iter().enumerate() {
            let member = Arc::clone(member);
            let member_ctx = member_ctx.clone();
            set.spawn(async move { (index, member.run(&member_ctx).await) });
        }

        let mut outputs: Vec<(usize, AgentOutput)> = Vec::new();
        let mut errors: Vec<(usize, AppError)> = Vec::new();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(output))) => outputs.push((index, output)),
                Ok((index, Err(e))) => {
                    tracing::warn!(group = %self.name, error = %e, "Group member failed");
                    errors.push((index, e));
                }
                Err(join_err) => {
                    tracing::warn!(group = %self.name, error = %join_err, "Group member task aborted");
                    errors.push((
                        usize::MAX,
                        AppError::Internal(format!("member task aborted: {}", join_err)),
                    ));
                }
            }
        }

        if outputs.is_empty() && !errors.is_empty() {
            errors.sort_by_key(|(index, _)| *index);
            let (_, first) = errors.remove(0);
            return Err(first.within(&self.name));
        }

        outputs.sort_by_key(|(index, _)| *index);

        let mut group_output = AgentOutput::new(self.name.clone());
        for (_, output) in outputs {
            group_output.exit_requested |= output.exit_requested;
            group_output.push_child(output);
        }
        group_output.content = group_output
            .children
            .iter()
            .filter(|child| !child.content.trim().is_empty())
            .map(|child| format!("[{}] {}", child.agent, child.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        tracing::info!(
            group = %self.name,
            succeeded = group_output.children.len(),
            failed = errors.len(),
            "Parallel group joined"
        );

        Ok(group_output)
    }
}
