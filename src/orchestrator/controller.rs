//! Sequential execution of a plan's phases.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::driver::PhaseDriver;
use super::state::{PhaseRecord, PhaseVerdict, RunOutcome, RunReport, RunState, SuccessKind};
use crate::errors::RunError;
use crate::plan::{MissingVerification, PhaseOrder, Plan, RunWindow};
use crate::ui::RunUi;

/// Run-level settings.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub order: PhaseOrder,
    /// Pause between a successful phase and the next one
    pub phase_pause: Duration,
    pub missing_verification: MissingVerification,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            order: PhaseOrder::default(),
            phase_pause: Duration::from_secs(1),
            missing_verification: MissingVerification::default(),
        }
    }
}

pub struct RunController {
    driver: PhaseDriver,
    settings: RunSettings,
    show_ui: bool,
}

impl RunController {
    pub fn new(driver: PhaseDriver, settings: RunSettings) -> Self {
        Self {
            driver,
            settings,
            show_ui: false,
        }
    }

    /// Render progress bars while running.
    pub fn with_ui(mut self) -> Self {
        self.show_ui = true;
        self
    }

    /// Load the plan and run every selected phase in order, stopping at the
    /// first failure.
    ///
    /// Returns `Interrupted` as soon as `cancel` fires; the in-flight agent
    /// session is dropped, which kills the agent process.
    pub async fn execute(
        &mut self,
        plan_path: &Path,
        window: RunWindow,
        cancel: &CancellationToken,
    ) -> Result<RunReport, RunError> {
        let started_at = Utc::now();
        let plan = Plan::load(plan_path, self.settings.missing_verification)?;
        tracing::info!("Found {} phases in plan", plan.phases.len());

        let phases = plan.select(window, self.settings.order);
        if phases.is_empty() {
            tracing::warn!(
                "No phases in range {}..={} (plan has {})",
                window.start.map(|n| n.to_string()).unwrap_or_default(),
                window.end.map(|n| n.to_string()).unwrap_or_default(),
                plan.phases.len()
            );
        }

        let ui = self
            .show_ui
            .then(|| Arc::new(RunUi::new(phases.len() as u64, self.driver.settings().verbose)));
        self.driver.set_ui(ui.clone());

        let plan_ref = plan_path.display().to_string();
        let total = phases.len();
        let mut records = Vec::with_capacity(total);
        let mut state = RunState::Pending.start(total)?;
        let mut outcome = RunOutcome::Completed;

        while let Some(index) = state.current() {
            let phase = phases[index];
            tracing::info!("{}", "=".repeat(60));
            tracing::info!(
                "Starting Phase {}/{}: {}",
                phase.number,
                total,
                phase.name
            );
            tracing::info!("{}", "=".repeat(60));
            if let Some(ui) = &ui {
                ui.start_phase(phase.number, &phase.name);
            }

            let phase_started = Utc::now();
            let clock = Instant::now();
            let verdict = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    if let Some(ui) = &ui {
                        ui.finish();
                    }
                    return Err(RunError::Interrupted { phase: Some(phase.number) });
                }
                verdict = self.driver.run(&plan_ref, phase) => verdict?,
            };
            let duration = clock.elapsed();

            if let Some(ui) = &ui {
                match &verdict {
                    PhaseVerdict::Success(SuccessKind::AlreadyComplete) => {
                        ui.phase_skipped(phase.number)
                    }
                    PhaseVerdict::Success(SuccessKind::DryRun) => ui.phase_dry_run(phase.number),
                    PhaseVerdict::Success(_) => ui.phase_complete(phase.number, duration),
                    PhaseVerdict::Failure(reason) => {
                        ui.phase_failed(phase.number, &reason.to_string())
                    }
                }
            }

            records.push(PhaseRecord {
                number: phase.number,
                name: phase.name.clone(),
                verdict: verdict.clone(),
                started_at: phase_started,
                duration,
            });

            match verdict {
                PhaseVerdict::Failure(reason) => {
                    tracing::error!(
                        "Phase {} failed ({}), stopping implementation",
                        phase.number,
                        reason
                    );
                    state = state.stop()?;
                    outcome = RunOutcome::Stopped {
                        number: phase.number,
                        name: phase.name.clone(),
                        reason,
                    };
                }
                PhaseVerdict::Success(kind) => {
                    if kind != SuccessKind::AlreadyComplete {
                        tracing::info!("Phase {} completed successfully", phase.number);
                    }
                    state = state.advance(total)?;
                    let agent_ran = matches!(
                        kind,
                        SuccessKind::Completed | SuccessKind::ManualVerificationPending
                    );
                    if agent_ran && !state.is_terminal() {
                        self.pause(cancel, ui.as_deref()).await?;
                    }
                }
            }
        }

        if let Some(ui) = &ui {
            ui.finish();
        }
        if outcome == RunOutcome::Completed {
            tracing::info!("Implementation complete!");
        }

        Ok(RunReport {
            plan_path: plan_path.to_path_buf(),
            records,
            outcome,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Gap before the next fresh agent session.
    async fn pause(&self, cancel: &CancellationToken, ui: Option<&RunUi>) -> Result<(), RunError> {
        if self.settings.phase_pause.is_zero() {
            return Ok(());
        }
        tracing::info!("Clearing context for next phase...");
        if let Some(ui) = ui {
            ui.between_phases(self.settings.phase_pause);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RunError::Interrupted { phase: None }),
            _ = tokio::time::sleep(self.settings.phase_pause) => Ok(()),
        }
    }
}
