use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agentflow_console::{run_console, run_headless, ConsoleConfig, RunOutcome, StreamController};
use agentflow_network::HttpStreamConnector;
use agentflow_protocol::NodeRegistry;

#[derive(Parser, Debug)]
#[command(name = "agentflow", version, about = "Watch an agent flow event stream on a terminal canvas")]
struct Args {
    /// Config file (default: <config dir>/agentflow/console.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// SSE endpoint to read events from.
    #[arg(long)]
    url: Option<String>,

    /// Node whose `complete` event ends the run.
    #[arg(long)]
    terminal_node: Option<String>,

    /// Run one simulation and print transitions instead of opening the canvas.
    #[arg(long)]
    headless: bool,

    /// Log file for canvas mode.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConsoleConfig::load(args.config.as_deref())?;
    if let Some(url) = args.url {
        config.stream_url = url;
    }
    if let Some(node) = args.terminal_node {
        config.terminal_node = node;
    }
    if let Some(path) = args.log_file {
        config.log_file = Some(path);
    }
    config.validate()?;

    // the canvas owns stdout, so logs go to a file there
    let log_path = (!args.headless).then(|| config.log_path());
    init_tracing(&config.log_filter, log_path.as_deref())?;

    let url = config.stream_url()?;
    let connector = HttpStreamConnector::new(url)?;
    let mut controller = StreamController::new(connector, config.terminal_node.clone());
    let registry = NodeRegistry::builtin();

    if args.headless {
        let mut stdout = std::io::stdout().lock();
        let outcome = run_headless(&mut controller, &registry, &mut stdout).await?;
        if let RunOutcome::Failed(reason) = outcome {
            anyhow::bail!("simulation did not complete: {reason}");
        }
        return Ok(());
    }

    run_console(controller, registry, config.tick_rate()).await
}

fn init_tracing(default_filter: &str, log_path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;

    match log_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
