//! `autoplan --create <description>`: write a plan, then optionally run it.

use anyhow::Result;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use autoplan::agent::Agent;
use autoplan::config::AutoplanToml;
use autoplan::create::PlanCreator;
use autoplan::errors::RunError;
use autoplan::plan::RunWindow;

use super::prompt::blocking_prompt;
use super::run::{RunFlags, cmd_run};

pub async fn cmd_create(
    config: &AutoplanToml,
    agent: Arc<dyn Agent>,
    description: &str,
    flags: RunFlags,
    assume_yes: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let creator = PlanCreator::new(agent.clone(), &config.templates.plans_dir)
        .command(config.templates.create.clone())
        .permission_mode(config.agent.permission_mode)
        .dry_run(flags.dry_run)
        .verbose(flags.verbose);

    let created = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RunError::Interrupted { phase: None }.into()),
        created = creator.create(description) => created?,
    };

    let Some(plan_path) = created else {
        tracing::warn!("The agent did not report where the plan was written");
        return Ok(());
    };
    println!("\nPlan created at: {}", plan_path.display());

    if flags.dry_run {
        tracing::info!("[DRY RUN] Would implement {}", plan_path.display());
        return Ok(());
    }

    let implement = if assume_yes {
        true
    } else {
        blocking_prompt(cancel, || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Implement now?")
                .default(false)
                .interact()
        })
        .await?
    };

    if implement {
        cmd_run(config, agent, &plan_path, RunWindow::default(), flags, cancel).await?;
    }
    Ok(())
}
