//! # The Historical Court
//!
//! A multi-agent research pipeline that produces balanced reports on a
//! historical figure or event. Two researchers gather evidence from opposite
//! sides in parallel, a judge audits the record in a bounded loop, and a
//! verdict writer files the final report to disk.
//!
//! ## Overview
//!
//! The crate can be used in two ways:
//!
//! 1. **As a CLI** - Run the `historical-court` binary
//! 2. **As a library** - Assemble a [`HistoricalCourt`] or compose your own
//!    pipeline from the generic agents in [`agents`]
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use court::{CourtConfig, HistoricalCourt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = CourtConfig::load_or_default(None)?;
//!     config.apply_env()?;
//!
//!     let court = HistoricalCourt::builder(config).build()?;
//!     let report = court.hear("Nikola Tesla").await?;
//!
//!     println!("{} passes, report at {:?}", report.passes, report.report_path);
//!     Ok(())
//! }
//! ```
//!
//! ### Composing Agents
//!
//! ```rust,ignore
//! use court::agents::{IterationLoop, LlmAgent, ParallelGroup, Pipeline};
//! use std::sync::Arc;
//!
//! let team = ParallelGroup::new("team")
//!     .member(Arc::new(LlmAgent::new("left", client.clone())))
//!     .member(Arc::new(LlmAgent::new("right", client.clone())));
//!
//! let review = IterationLoop::new("review", 3)
//!     .sub_agent(Arc::new(team))
//!     .sub_agent(Arc::new(LlmAgent::new("judge", client)));
//!
//! let root = Pipeline::new("root").stage(Arc::new(review));
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Agent trait plus parallel, loop and pipeline composition
//! - [`court`] - The court's fixed wiring and prompts
//! - [`llm`] - Model clients and the tool-calling coordinator
//! - [`state`] - Shared session state and instruction templates
//! - [`tools`] - Wikipedia search, state append, file writer, loop exit
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration loading

#![warn(rustdoc::missing_crate_level_docs)]

/// Agent composition: LLM agents, parallel groups, loops, pipelines.
pub mod agents;
/// Command-line parsing and terminal output.
pub mod cli;
/// The Historical Court wiring.
pub mod court;
/// LLM provider clients and the tool-calling loop.
pub mod llm;
/// Shared key-value session state.
pub mod state;
/// Built-in tools.
pub mod tools;
/// Core types and errors.
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{Agent, AgentOutput, CancellationFlag, LoopTermination, RunReport};
pub use court::HistoricalCourt;
pub use llm::{LLMClient, LLMResponse, Provider};
pub use state::{SharedState, StateSnapshot, StateValue};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::{ConfigError, CourtConfig};
