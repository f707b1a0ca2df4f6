//! Capabilities agents may invoke
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - `Tool` trait, per-agent registry and invocation context
//! - [`search`](crate::tools::search) - `wikipedia` retrieval over the MediaWiki API
//! - [`state`](crate::tools::state) - `append_to_state` accumulator writes
//! - [`file`](crate::tools::file) - `write_file` report persistence
//! - [`exit_loop`](crate::tools::exit_loop) - loop termination signal
//!
//! Every tool answers with a JSON object carrying at least
//! `{"status": "success"}`; failures surface as errors which the coordinator
//! turns into `{"status": "error"}` records for the model.

pub mod exit_loop;
pub mod file;
/// Tool registry and invocation context.
pub mod registry;
/// Wikipedia search tool and backend.
pub mod search;
pub mod state;

pub use exit_loop::ExitLoopTool;
pub use file::WriteFileTool;
pub use registry::{Tool, ToolContext, ToolRegistry};
pub use search::{SearchBackend, WikipediaClient, WikipediaConfig, WikipediaTool};
pub use state::AppendToStateTool;
