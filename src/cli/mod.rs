//! CLI module for the Historical Court
//!
//! Provides command-line parsing for the `historical-court` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::{ConfigError, CourtConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The Historical Court
///
/// Two researchers argue a topic from opposite sides, a judge audits the
/// record until it is balanced, and a verdict writer files the final report.
#[derive(Parser, Debug)]
#[command(
    name = "historical-court",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "The Historical Court - balanced multi-agent research reports",
    args_conflicts_with_subcommands = true,
    after_help = "EXAMPLES:\n    \
                  historical-court \"Nikola Tesla\"          # Hear a topic\n    \
                  historical-court                         # Prompt for a topic\n    \
                  historical-court -n 5 --json \"Apollo 11\" # Five passes max, JSON report\n    \
                  historical-court config --validate       # Check the configuration"
)]
pub struct Cli {
    /// Historical figure or event to put on trial
    pub topic: Option<String>,

    /// Path to the configuration file (defaults to ./court.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Model to use for every agent (overrides config and MODEL)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Model provider: ollama or openai
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Maximum research-and-audit passes
    #[arg(short = 'n', long, global = true)]
    pub max_iterations: Option<usize>,

    /// Root directory reports are written under
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the resolved configuration
    Config {
        /// Validate the configuration and exit non-zero if invalid
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply flag overrides on top of file and environment settings.
    pub fn apply_overrides(&self, config: &mut CourtConfig) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.parse()?;
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max) = self.max_iterations {
            config.court.max_iterations = max;
        }
        if let Some(dir) = &self.output_dir {
            config.court.output_root = dir.clone();
        }
        Ok(())
    }
}
