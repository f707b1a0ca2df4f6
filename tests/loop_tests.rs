//! Review-loop behavior through the model layer: parallel researchers plus a
//! judge that calls `exit_loop` on a chosen pass.

mod common;

use common::mocks::{tool_call, ScriptedLLMClient};
use court::agents::{
    Agent, InvocationContext, IterationLoop, LlmAgent, LoopTermination, ParallelGroup,
};
use court::llm::{LLMResponse, ToolCallingConfig};
use court::tools::{AppendToStateTool, ExitLoopTool};
use court::SharedState;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

fn researcher(name: &str, field: &str) -> LlmAgent {
    let client = ScriptedLLMClient::new(name, vec![]).with_fallback(tool_call(
        "append_to_state",
        json!({"field": field, "response": format!("finding from {name}")}),
    ));
    // Every round appends, so cap each run at a single round.
    LlmAgent::new(name, Arc::new(client))
        .instruction("Research { TOPIC? }")
        .tool(Arc::new(AppendToStateTool))
        .tool_config(ToolCallingConfig {
            max_iterations: 1,
            ..Default::default()
        })
}

fn judge_exiting_on(pass: Option<usize>) -> (LlmAgent, Arc<ScriptedLLMClient>) {
    let mut script = Vec::new();
    if let Some(pass) = pass {
        for _ in 1..pass {
            script.push(LLMResponse::text("RE-RESEARCH: go deeper."));
        }
        script.push(tool_call("exit_loop", json!({})));
    }
    let client = Arc::new(
        ScriptedLLMClient::new("judge", script)
            .with_fallback(LLMResponse::text("RE-RESEARCH: go deeper.")),
    );
    let judge = LlmAgent::new("judge", client.clone())
        .tool(Arc::new(ExitLoopTool))
        .output_key("judge_feedback");
    (judge, client)
}

fn review_loop(max: usize, judge: LlmAgent) -> IterationLoop {
    let team = ParallelGroup::new("investigation_team")
        .member(Arc::new(researcher("admirer", "pos_data")))
        .member(Arc::new(researcher("critic_investigator", "neg_data")));

    IterationLoop::new("trial_review_loop", max)
        .sub_agent(Arc::new(team))
        .sub_agent(Arc::new(judge))
}

#[rstest]
#[case::first_pass(1, 3)]
#[case::second_pass(2, 3)]
#[case::on_the_cap(3, 3)]
#[case::single_pass_cap(1, 1)]
#[tokio::test]
async fn test_exit_on_pass_n(#[case] exit_pass: usize, #[case] max: usize) {
    let (judge, judge_client) = judge_exiting_on(Some(exit_pass));
    let review = review_loop(max, judge);
    let state = SharedState::new();

    let output = review.run(&InvocationContext::new(state.clone())).await.unwrap();
    let summary = output.loop_summary.unwrap();

    assert_eq!(summary.passes, exit_pass);
    assert_eq!(summary.termination, LoopTermination::Signal);
    assert!(!output.exit_requested, "the loop consumes the exit signal");
    assert_eq!(judge_client.calls(), exit_pass);
    assert_eq!(state.len("pos_data"), exit_pass);
    assert_eq!(state.len("neg_data"), exit_pass);
    assert_eq!(output.count_runs("admirer"), exit_pass);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
#[tokio::test]
async fn test_judge_never_satisfied_runs_to_cap(#[case] max: usize) {
    let (judge, judge_client) = judge_exiting_on(None);
    let review = review_loop(max, judge);
    let state = SharedState::new();

    let output = review.run(&InvocationContext::new(state.clone())).await.unwrap();
    let summary = output.loop_summary.unwrap();

    assert_eq!(summary.passes, max);
    assert_eq!(summary.termination, LoopTermination::Cap);
    assert_eq!(judge_client.calls(), max);
    assert_eq!(state.len("pos_data"), max);
    assert_eq!(
        state.get_text("judge_feedback").as_deref(),
        Some("RE-RESEARCH: go deeper.")
    );
}

#[tokio::test]
async fn test_zero_cap_is_raised_to_one_pass() {
    let (judge, _) = judge_exiting_on(None);
    let review = review_loop(0, judge);
    assert_eq!(review.max_iterations(), 1);

    let output = review
        .run(&InvocationContext::new(SharedState::new()))
        .await
        .unwrap();
    assert_eq!(output.loop_summary.unwrap().passes, 1);
}

#[tokio::test]
async fn test_parallel_members_see_pinned_snapshot() {
    let state = SharedState::new();
    state.set("TOPIC", "Marie Curie").unwrap();
    state.append("pos_data", "Nobel Prize in Physics, 1903").unwrap();

    let client = Arc::new(ScriptedLLMClient::new("critic", vec![]));
    let critic = LlmAgent::new("critic_investigator", client.clone())
        .instruction("Topic: { TOPIC? }\nSupporting record:\n{ pos_data? }");
    let admirer = researcher("admirer", "pos_data");

    let team = ParallelGroup::new("investigation_team")
        .member(Arc::new(admirer))
        .member(Arc::new(critic));
    team.run(&InvocationContext::new(state.clone())).await.unwrap();

    let prompt = &client.system_prompts()[0];
    assert!(prompt.contains("Topic: Marie Curie"));
    assert!(prompt.contains("- Nobel Prize in Physics, 1903"));
    // The admirer's concurrent append is never visible mid-pass.
    assert!(!prompt.contains("finding from admirer"));
    assert_eq!(state.len("pos_data"), 2);
}
