//! The Historical Court
//!
//! Wires the generic agents into the court's fixed composition:
//!
//! ```text
//! inquiry (controller)
//! └── historical_court_system (pipeline)
//!     ├── trial_review_loop (loop, cap = court.max_iterations)
//!     │   ├── investigation_team (parallel)
//!     │   │   ├── admirer              -> pos_data
//!     │   │   └── critic_investigator  -> neg_data
//!     │   └── judge                    -> exit_loop | judge_feedback
//!     └── verdict_agent                -> write_file
//! ```

/// Instruction templates.
pub mod prompts;

use crate::agents::{
    Agent, CancellationFlag, Controller, IterationLoop, LlmAgent, ParallelGroup, Pipeline,
    RunReport,
};
use crate::llm::{LLMClient, Provider};
use crate::state::SharedState;
use crate::tools::{
    AppendToStateTool, ExitLoopTool, SearchBackend, Tool, WikipediaClient, WikipediaTool,
    WriteFileTool,
};
use crate::types::Result;
use crate::utils::CourtConfig;
use std::collections::HashMap;
use std::sync::Arc;

pub const ADMIRER: &str = "admirer";
pub const CRITIC: &str = "critic_investigator";
pub const INVESTIGATION_TEAM: &str = "investigation_team";
pub const JUDGE: &str = "judge";
pub const TRIAL_REVIEW_LOOP: &str = "trial_review_loop";
pub const VERDICT_AGENT: &str = "verdict_agent";
pub const COURT_SYSTEM: &str = "historical_court_system";
pub const INQUIRY: &str = "inquiry";

/// Accumulator for supporting evidence.
pub const POS_DATA: &str = "pos_data";
/// Accumulator for critical evidence.
pub const NEG_DATA: &str = "neg_data";
/// Control key holding the judge's latest directive.
pub const JUDGE_FEEDBACK: &str = "judge_feedback";

const LLM_AGENTS: [&str; 4] = [ADMIRER, CRITIC, JUDGE, VERDICT_AGENT];

/// A fully wired court, ready to hear topics.
pub struct HistoricalCourt {
    controller: Controller,
    config: CourtConfig,
}

impl HistoricalCourt {
    pub fn builder(config: CourtConfig) -> HistoricalCourtBuilder {
        HistoricalCourtBuilder {
            config,
            default_client: None,
            agent_clients: HashMap::new(),
            search: None,
        }
    }

    /// Hear `topic` with a fresh state.
    pub async fn hear(&self, topic: &str) -> Result<RunReport> {
        self.controller.run(topic).await
    }

    /// Hear `topic` against a caller-provided state, honouring `cancellation`
    /// between review passes.
    pub async fn hear_with(
        &self,
        topic: &str,
        state: SharedState,
        cancellation: CancellationFlag,
    ) -> Result<RunReport> {
        self.controller.run_with(topic, state, cancellation).await
    }

    pub fn config(&self) -> &CourtConfig {
        &self.config
    }
}

pub struct HistoricalCourtBuilder {
    config: CourtConfig,
    default_client: Option<Arc<dyn LLMClient>>,
    agent_clients: HashMap<String, Arc<dyn LLMClient>>,
    search: Option<Arc<dyn SearchBackend>>,
}

impl HistoricalCourtBuilder {
    /// Use `client` for every agent without a more specific override.
    pub fn client(mut self, client: Arc<dyn LLMClient>) -> Self {
        self.default_client = Some(client);
        self
    }

    /// Use `client` for the agent called `agent`.
    pub fn agent_client(mut self, agent: &str, client: Arc<dyn LLMClient>) -> Self {
        self.agent_clients.insert(agent.to_string(), client);
        self
    }

    /// Replace the Wikipedia backend.
    pub fn search_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(backend);
        self
    }

    pub fn build(self) -> Result<HistoricalCourt> {
        let config = self.config;
        config.validate()?;

        for agent in config.llm.agent_models.keys() {
            if !LLM_AGENTS.contains(&agent.as_str()) {
                tracing::warn!(agent = %agent, "Model override for unknown agent ignored");
            }
        }

        let mut provider: Option<Provider> = None;
        let mut client_for = |name: &str| -> Result<Arc<dyn LLMClient>> {
            if let Some(client) = self.agent_clients.get(name) {
                return Ok(Arc::clone(client));
            }
            let override_model = config.llm.agent_models.get(name);
            if override_model.is_none() {
                if let Some(client) = &self.default_client {
                    return Ok(Arc::clone(client));
                }
            }
            let base = match &provider {
                Some(existing) => existing.clone(),
                None => {
                    let resolved = config.provider()?;
                    provider = Some(resolved.clone());
                    resolved
                }
            };
            let chosen = match override_model {
                Some(model) => base.with_model(model.clone()),
                None => base.clone(),
            };
            chosen.create_client(&config.client_options())
        };

        let admirer_client = client_for(ADMIRER)?;
        let critic_client = client_for(CRITIC)?;
        let judge_client = client_for(JUDGE)?;
        let verdict_client = client_for(VERDICT_AGENT)?;

        let search: Arc<dyn SearchBackend> = match self.search {
            Some(backend) => backend,
            None => Arc::new(WikipediaClient::new(config.wikipedia())?),
        };
        let wikipedia: Arc<dyn Tool> = Arc::new(WikipediaTool::new(search));
        let append: Arc<dyn Tool> = Arc::new(AppendToStateTool);
        let write_file: Arc<dyn Tool> = Arc::new(WriteFileTool::new(config.court.output_root.clone()));
        let exit_loop: Arc<dyn Tool> = Arc::new(ExitLoopTool);
        let tool_config = config.tool_calling();

        let admirer = LlmAgent::new(ADMIRER, admirer_client)
            .description(prompts::ADMIRER_DESCRIPTION)
            .instruction(prompts::ADMIRER_INSTRUCTION)
            .kickoff(prompts::KICKOFF)
            .tool(Arc::clone(&wikipedia))
            .tool(Arc::clone(&append))
            .tool_config(tool_config.clone());

        let critic = LlmAgent::new(CRITIC, critic_client)
            .description(prompts::CRITIC_DESCRIPTION)
            .instruction(prompts::CRITIC_INSTRUCTION)
            .kickoff(prompts::KICKOFF)
            .tool(wikipedia)
            .tool(append)
            .tool_config(tool_config.clone());

        let judge = LlmAgent::new(JUDGE, judge_client)
            .description(prompts::JUDGE_DESCRIPTION)
            .instruction(prompts::JUDGE_INSTRUCTION)
            .kickoff(prompts::KICKOFF)
            .tool(exit_loop)
            .output_key(JUDGE_FEEDBACK)
            .tool_config(tool_config.clone());

        let verdict_instruction = prompts::VERDICT_INSTRUCTION
            .replace("{ REPORT_DIRECTORY? }", &config.court.report_directory);
        let verdict = LlmAgent::new(VERDICT_AGENT, verdict_client)
            .description(prompts::VERDICT_DESCRIPTION)
            .instruction(verdict_instruction)
            .kickoff(prompts::KICKOFF)
            .tool(write_file)
            .tool_config(tool_config);

        let investigation_team = ParallelGroup::new(INVESTIGATION_TEAM)
            .member(Arc::new(admirer))
            .member(Arc::new(critic));

        let mut review = IterationLoop::new(TRIAL_REVIEW_LOOP, config.court.max_iterations)
            .sub_agent(Arc::new(investigation_team))
            .sub_agent(Arc::new(judge));

        let min_evidence = config.court.min_evidence_per_side;
        if min_evidence > 0 {
            review = review.with_exit_guard(move |snapshot| {
                snapshot.len_of(POS_DATA) >= min_evidence && snapshot.len_of(NEG_DATA) >= min_evidence
            });
        }

        let system = Pipeline::new(COURT_SYSTEM)
            .stage(Arc::new(review))
            .stage(Arc::new(verdict));

        let root: Arc<dyn Agent> = Arc::new(system);
        tracing::debug!(root = root.name(), max_iterations = config.court.max_iterations, "Court assembled");

        Ok(HistoricalCourt {
            controller: Controller::new(INQUIRY, root),
            config,
        })
    }
}
