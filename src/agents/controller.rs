use crate::agents::{Agent, CancellationFlag, InvocationContext, LoopTermination};
use crate::state::{SharedState, StateSnapshot, TOPIC_KEY};
use crate::types::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of one court run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub topic: String,
    /// Path of the last successfully written report, if any was written.
    pub report_path: Option<PathBuf>,
    pub passes: usize,
    pub termination: Option<LoopTermination>,
    /// Final text of the last stage.
    pub verdict: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: StateSnapshot,
}

/// Entry point: seeds `TOPIC` and runs the root unit.
pub struct Controller {
    name: String,
    root: Arc<dyn Agent>,
}

impl Controller {
    pub fn new(name: impl Into<String>, root: Arc<dyn Agent>) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run with a fresh state and no cancellation.
    pub async fn run(&self, topic: &str) -> Result<RunReport> {
        self.run_with(topic, SharedState::new(), CancellationFlag::new())
            .await
    }

    pub async fn run_with(
        &self,
        topic: &str,
        state: SharedState,
        cancellation: CancellationFlag,
    ) -> Result<RunReport> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidInput("topic must not be empty".to_string()));
        }

        state.set(TOPIC_KEY, topic)?;
        let started_at = Utc::now();
        tracing::info!(controller = %self.name, topic, root = self.root.name(), "Court in session");

        let ctx = InvocationContext::new(state.clone()).with_cancellation(cancellation);
        let output = self.root.run(&ctx).await?;

        let mut report_path = None;
        let mut failed_writes: Vec<(&str, String)> = Vec::new();
        for (agent, record) in output.all_tool_calls() {
            if record.name != "write_file" {
                continue;
            }
            if record.success {
                report_path = record.result["path"].as_str().map(PathBuf::from);
            } else {
                failed_writes.push((agent, record.error.clone().unwrap_or_default()));
            }
        }

        if report_path.is_none() {
            if let Some((agent, error)) = failed_writes.last() {
                return Err(AppError::Persist(format!(
                    "all {} write_file attempt(s) failed, last: {}",
                    failed_writes.len(),
                    error
                ))
                .within(agent)
                .within(self.root.name()));
            }
            tracing::warn!(controller = %self.name, "No report was written");
        }

        let summary = output.find_loop_summary();
        let finished_at = Utc::now();

        tracing::info!(
            controller = %self.name,
            passes = summary.map(|s| s.passes).unwrap_or(0),
            report = ?report_path,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Court adjourned"
        );

        Ok(RunReport {
            topic: topic.to_string(),
            report_path,
            passes: summary.map(|s| s.passes).unwrap_or(0),
            termination: summary.map(|s| s.termination),
            verdict: output.content,
            started_at,
            finished_at,
            state: state.snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentOutput;
    use crate::llm::ToolCallRecord;
    use async_trait::async_trait;
    use serde_json::json;

    struct Writer {
        results: Vec<bool>,
    }

    #[async_trait]
    impl Agent for Writer {
        fn name(&self) -> &str {
            "verdict_agent"
        }

        async fn run(&self, _ctx: &InvocationContext) -> Result<AgentOutput> {
            let mut output = AgentOutput::new("verdict_agent");
            for (i, ok) in self.results.iter().enumerate() {
                output.tool_calls.push(ToolCallRecord {
                    id: i.to_string(),
                    name: "write_file".to_string(),
                    arguments: json!({}),
                    result: if *ok {
                        json!({"status": "success", "path": format!("court_reports/v{}.txt", i)})
                    } else {
                        json!({"status": "error"})
                    },
                    success: *ok,
                    duration_ms: 1,
                    error: (!ok).then(|| "read-only file system".to_string()),
                });
            }
            Ok(output)
        }
    }

    fn controller(results: Vec<bool>) -> Controller {
        Controller::new("inquiry", Arc::new(Writer { results }))
    }

    #[tokio::test]
    async fn test_rejects_blank_topic() {
        let err = controller(vec![]).run("   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_report_path_is_last_success() {
        let report = controller(vec![true, false, true]).run(" Ada Lovelace ").await.unwrap();
        assert_eq!(report.topic, "Ada Lovelace");
        assert_eq!(report.report_path, Some(PathBuf::from("court_reports/v2.txt")));
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_all_writes_failing_is_persist_error() {
        let err = controller(vec![false, false]).run("Ada").await.unwrap_err();
        assert!(matches!(err.root_cause(), AppError::Persist(_)));
        assert!(err.agent_path().unwrap_or_default().ends_with("verdict_agent"));
    }

    #[tokio::test]
    async fn test_no_write_attempt_has_no_path() {
        let report = controller(vec![]).run("Ada").await.unwrap();
        assert!(report.report_path.is_none());
        assert_eq!(report.state.get(TOPIC_KEY).map(|v| v.render()), Some("Ada".to_string()));
    }
}
