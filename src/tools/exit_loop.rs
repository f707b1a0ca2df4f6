use crate::tools::registry::{Tool, ToolContext};
use crate::types::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// The `exit_loop` capability.
///
/// Raises the termination signal on the calling invocation. The enclosing
/// iteration loop sees it as `exit_requested` on the agent's output.
pub struct ExitLoopTool;

#[async_trait]
impl Tool for ExitLoopTool {
    fn name(&self) -> &str {
        "exit_loop"
    }

    fn description(&self) -> &str {
        "Call this only when the research is balanced and complete, to end the review loop"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> Result<Value> {
        ctx.request_exit();
        tracing::info!(agent = ctx.agent(), "Exit requested");
        Ok(json!({"status": "success"}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;

    #[tokio::test]
    async fn test_raises_signal() {
        let ctx = ToolContext::new(SharedState::new(), "judge");
        assert!(!ctx.exit_requested());

        let result = ExitLoopTool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(result["status"], "success");
        assert!(ctx.exit_requested());
    }
}
