use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use autoplan::agent::{Agent, ClaudeCli};
use autoplan::config::{AutoplanToml, Overrides};
use autoplan::errors::RunError;
use autoplan::plan::{PhaseOrder, RunWindow};

mod cmd;

#[derive(Parser)]
#[command(name = "autoplan")]
#[command(version, about = "Implement a markdown plan phase by phase through Claude")]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["plan", "create", "interactive"])
))]
pub struct Cli {
    /// Path to an existing plan file to implement
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Create a new plan with the given task description
    #[arg(long, value_name = "DESCRIPTION")]
    pub create: Option<String>,

    /// Run in interactive mode
    #[arg(long)]
    pub interactive: bool,

    /// Phase number to start from (inclusive)
    #[arg(long, value_name = "N")]
    pub start_phase: Option<u32>,

    /// Phase number to end at (inclusive)
    #[arg(long, value_name = "N")]
    pub end_phase: Option<u32>,

    /// Show detailed output
    #[arg(short, long)]
    pub verbose: bool,

    /// Show what would be done without executing
    #[arg(long)]
    pub dry_run: bool,

    /// List the plan's phases and checklist progress without running anything
    #[arg(long, requires = "plan")]
    pub list: bool,

    /// Configuration file (default: ./autoplan.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Implement a newly created plan without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Per-phase time limit in seconds (0 for no limit)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Phase execution order: numeric or document
    #[arg(long, value_name = "ORDER")]
    pub order: Option<PhaseOrder>,

    /// Treat phases without an automated verification section as incomplete
    #[arg(long)]
    pub strict_verification: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            timeout_secs: self.timeout,
            order: self.order,
            strict_verification: self.strict_verification,
        }
    }

    fn window(&self) -> RunWindow {
        RunWindow::new(self.start_phase, self.end_phase)
    }

    fn flags(&self) -> cmd::RunFlags {
        cmd::RunFlags {
            dry_run: self.dry_run,
            verbose: self.verbose,
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<AutoplanToml> {
    let mut config = match &cli.config {
        Some(path) => AutoplanToml::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            AutoplanToml::load_or_default(&cwd)?
        }
    };
    config.apply_overrides(&cli.overrides());
    Ok(config)
}

async fn run(cli: &Cli, cancel: &CancellationToken) -> Result<()> {
    let config = load_config(cli)?;
    let agent: Arc<dyn Agent> = Arc::new(ClaudeCli::new(config.claude_cmd()));
    tracing::debug!(command = %config.claude_cmd(), "using agent command");

    if cli.interactive {
        cmd::cmd_interactive(&config, agent, cancel).await
    } else if let Some(description) = &cli.create {
        cmd::cmd_create(&config, agent, description, cli.flags(), cli.yes, cancel).await
    } else if let Some(plan) = &cli.plan {
        if cli.list {
            cmd::cmd_list(&config, plan, cli.window())
        } else {
            cmd::cmd_run(&config, agent, plan, cli.window(), cli.flags(), cancel).await
        }
    } else {
        anyhow::bail!("One of --plan, --create or --interactive is required")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match run(&cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if matches!(e.downcast_ref::<RunError>(), Some(RunError::Interrupted { .. })) => {
            eprintln!("\n\n{}", e);
            // a terminal prompt may still hold a blocking thread
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
