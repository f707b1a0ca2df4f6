//! Historical Court CLI Entry Point
//!
//! - `historical-court <topic>` - Hear a topic and file a report
//! - `historical-court` - Prompt for a topic interactively
//! - `historical-court config` - Show (or `--validate`) the resolved configuration

use anyhow::{Context, Result};
use court::agents::CancellationFlag;
use court::cli::output::Output;
use court::cli::{Cli, Commands, LogFormat};
use court::{CourtConfig, HistoricalCourt, SharedState};
use owo_colors::OwoColorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "court=info,historical_court=info";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_tracing(cli.log_format, cli.verbose)?;

    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let mut config = CourtConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Invalid environment override")?;
    cli.apply_overrides(&mut config)
        .context("Invalid command-line override")?;

    if let Some(Commands::Config { validate }) = cli.command {
        return show_config(&config, validate, &output);
    }

    let topic = match cli.topic.as_deref().map(str::trim) {
        Some(topic) if !topic.is_empty() => topic.to_string(),
        _ => {
            output.banner();
            output
                .ask_topic()
                .context("No topic given; pass one as an argument or enter it at the prompt")?
        }
    };

    let court = HistoricalCourt::builder(config)
        .build()
        .context("Failed to assemble the court")?;

    let cancellation = CancellationFlag::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current pass");
            on_interrupt.cancel();
        }
    });

    if !cli.json {
        output.info(&format!("The court is in session: {}", topic));
    }

    let report = court
        .hear_with(&topic, SharedState::new(), cancellation)
        .await
        .with_context(|| format!("The inquiry into '{}' failed", topic))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output.verdict(&report);
    }

    Ok(())
}

fn show_config(config: &CourtConfig, validate: bool, output: &Output) -> Result<()> {
    if validate {
        config.validate().context("Configuration is invalid")?;
        output.success("Configuration is valid");
        return Ok(());
    }

    output.header("Resolved configuration");
    output.kv("Provider", &config.llm.provider.to_string());
    output.kv("Endpoint", &config.base_url());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn init_tracing(format: LogFormat, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("court=debug,historical_court=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
