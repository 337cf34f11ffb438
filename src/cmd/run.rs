//! Plan execution: `autoplan --plan <path>` and `--list`.

use anyhow::Result;
use console::style;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use autoplan::agent::Agent;
use autoplan::config::AutoplanToml;
use autoplan::orchestrator::{
    PhaseDriver, PhaseVerdict, RunController, RunOutcome, RunReport, SuccessKind,
};
use autoplan::plan::{Plan, RunWindow};
use autoplan::templates::CommandTemplates;
use autoplan::ui::format_elapsed;

/// Flags shared by every mode that can run a plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub dry_run: bool,
    pub verbose: bool,
}

pub async fn cmd_run(
    config: &AutoplanToml,
    agent: Arc<dyn Agent>,
    plan_path: &Path,
    window: RunWindow,
    flags: RunFlags,
    cancel: &CancellationToken,
) -> Result<()> {
    let driver = PhaseDriver::new(
        agent,
        Box::new(config.signals.clone()),
        CommandTemplates::with_default_dirs(config.templates.dirs.clone()),
        config.driver_settings(flags.dry_run, flags.verbose),
    );
    let mut controller = RunController::new(driver, config.run_settings()).with_ui();

    let report = controller.execute(plan_path, window, cancel).await?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    match &report.outcome {
        RunOutcome::Completed => {
            println!("{}", style("Implementation complete!").green().bold())
        }
        RunOutcome::Stopped {
            number,
            name,
            reason,
        } => println!(
            "{} at phase {} ({}): {}",
            style("Stopped").red().bold(),
            number,
            name,
            reason
        ),
    }
    println!("{}", style("═".repeat(60)).cyan());

    for record in &report.records {
        let status = match &record.verdict {
            PhaseVerdict::Success(SuccessKind::AlreadyComplete) => {
                style("already complete".to_string()).dim()
            }
            PhaseVerdict::Success(SuccessKind::DryRun) => style("dry run".to_string()).dim(),
            PhaseVerdict::Success(SuccessKind::Completed) => {
                style("completed".to_string()).green()
            }
            PhaseVerdict::Success(SuccessKind::ManualVerificationPending) => {
                style("completed, awaiting manual verification".to_string()).yellow()
            }
            PhaseVerdict::Failure(reason) => style(format!("failed: {}", reason)).red(),
        };
        println!(
            "  Phase {:<4} {:<40} {} {}",
            record.number,
            record.name,
            status,
            style(format_elapsed(record.duration)).dim()
        );
    }
    if report.records.is_empty() {
        println!("  No phases selected");
    }

    let elapsed = report.elapsed().to_std().unwrap_or_default();
    println!();
    println!("Total time: {}", format_elapsed(elapsed));
}

/// Print every phase in the window with its checklist progress.
pub fn cmd_list(config: &AutoplanToml, plan_path: &Path, window: RunWindow) -> Result<()> {
    let plan = Plan::load(plan_path, config.run.missing_verification)?;
    let phases = plan.select(window, config.run.order);

    println!();
    println!("Plan: {}", plan_path.display());
    println!(
        "{} of {} phases complete",
        plan.completed_count(),
        plan.phases.len()
    );
    println!();
    println!("{:<8} {:<12} {:<12} Name", "Phase", "Automated", "Manual");
    println!(
        "{:<8} {:<12} {:<12} ----",
        "--------", "------------", "------------"
    );

    for phase in phases {
        let checklist = phase.checklist();
        let automated = if checklist.has_automated_section {
            format!(
                "{}/{}",
                checklist.automated_checked,
                checklist.automated_total()
            )
        } else {
            "-".to_string()
        };
        let manual = if checklist.has_manual_section {
            format!("{}/{}", checklist.manual_checked, checklist.manual_total())
        } else {
            "-".to_string()
        };
        let marker = if phase.is_completed {
            style("done".to_string()).green()
        } else {
            style("todo".to_string()).yellow()
        };
        println!(
            "{:<8} {:<12} {:<12} {} [{}]",
            phase.number, automated, manual, phase.name, marker
        );
    }
    println!();
    Ok(())
}
