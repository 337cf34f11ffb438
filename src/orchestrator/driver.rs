//! Drives a single phase through the agent.
//!
//! One call to [`PhaseDriver::run`] is one fresh agent conversation. The
//! stream is consumed to the end and every assistant text fragment is
//! classified; the last recognizable signal decides the verdict.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use super::state::{FailureReason, PhaseVerdict, SuccessKind};
use crate::agent::{Agent, AgentMessage, Fragment, MessageStream, PermissionMode, QueryOptions, Role};
use crate::errors::{AgentError, TemplateError};
use crate::plan::Phase;
use crate::signals::{PhaseSignals, Signal, SignalClassifier};
use crate::stream::{describe_tool_use, tool_emoji, truncate_str, truncate_thinking};
use crate::templates::{CommandTemplates, IMPLEMENT_COMMAND};
use crate::ui::RunUi;

/// Per-phase execution settings.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Template used to build the phase prompt
    pub implement_command: String,
    pub permission_mode: PermissionMode,
    /// Limit on one phase's agent session
    pub timeout: Option<Duration>,
    /// Log what would run without contacting the agent
    pub dry_run: bool,
    /// Echo agent text
    pub verbose: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            implement_command: IMPLEMENT_COMMAND.to_string(),
            permission_mode: PermissionMode::BypassPermissions,
            timeout: None,
            dry_run: false,
            verbose: false,
        }
    }
}

pub struct PhaseDriver {
    agent: Arc<dyn Agent>,
    classifier: Box<dyn SignalClassifier>,
    templates: CommandTemplates,
    settings: DriverSettings,
    ui: Option<Arc<RunUi>>,
}

impl PhaseDriver {
    pub fn new(
        agent: Arc<dyn Agent>,
        classifier: Box<dyn SignalClassifier>,
        templates: CommandTemplates,
        settings: DriverSettings,
    ) -> Self {
        Self {
            agent,
            classifier,
            templates,
            settings,
            ui: None,
        }
    }

    pub fn set_ui(&mut self, ui: Option<Arc<RunUi>>) {
        self.ui = ui;
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Drive one phase to a verdict.
    ///
    /// Agent failures become `Failure` verdicts; only a missing or unreadable
    /// template is an error.
    pub async fn run(&self, plan_ref: &str, phase: &Phase) -> Result<PhaseVerdict, TemplateError> {
        tracing::info!("Implementing Phase {}: {}", phase.number, phase.name);

        if phase.is_completed {
            tracing::info!("Phase {} already completed, skipping...", phase.number);
            return Ok(PhaseVerdict::Success(SuccessKind::AlreadyComplete));
        }

        if self.settings.dry_run {
            tracing::info!("[DRY RUN] Would implement phase {}", phase.number);
            return Ok(PhaseVerdict::Success(SuccessKind::DryRun));
        }

        let template = self.templates.load(&self.settings.implement_command)?;
        let prompt = phase_prompt(&template, plan_ref, phase.number);

        let verdict = match self.settings.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.drive(&prompt, phase.number)).await
            {
                Ok(verdict) => verdict,
                Err(_) => {
                    tracing::warn!(
                        "Phase {} timed out after {}s",
                        phase.number,
                        limit.as_secs()
                    );
                    PhaseVerdict::Failure(FailureReason::TimedOut(limit))
                }
            },
            None => self.drive(&prompt, phase.number).await,
        };
        Ok(verdict)
    }

    async fn drive(&self, prompt: &str, number: u32) -> PhaseVerdict {
        let options = QueryOptions::unattended(self.settings.permission_mode);
        let stream = match self.agent.query(prompt, &options).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Failed to start agent for phase {}: {}", number, e);
                return PhaseVerdict::Failure(FailureReason::Agent(e.to_string()));
            }
        };

        match self.consume(stream, number).await {
            Ok(signals) => {
                tracing::debug!("Phase {} signals: {}", number, signals.summary());
                verdict_from(&signals)
            }
            Err(e) => {
                tracing::error!("Agent error during phase {}: {}", number, e);
                PhaseVerdict::Failure(FailureReason::Agent(e.to_string()))
            }
        }
    }

    async fn consume(
        &self,
        mut stream: MessageStream,
        number: u32,
    ) -> Result<PhaseSignals, AgentError> {
        let mut signals = PhaseSignals::new();
        while let Some(message) = stream.next().await {
            let message = message?;
            match message.role {
                Role::Assistant => self.observe(&message, number, &mut signals),
                Role::Result if message.is_error => {
                    tracing::warn!("Agent reported an error result for phase {}", number);
                }
                _ => tracing::debug!("Non-assistant message: {:?}", message.role),
            }
        }
        Ok(signals)
    }

    fn observe(&self, message: &AgentMessage, number: u32, signals: &mut PhaseSignals) {
        for fragment in &message.fragments {
            match fragment {
                Fragment::Text(text) => {
                    tracing::debug!("Text block: {}", truncate_str(text, 100));
                    let signal = self.classifier.classify(text);
                    match signal {
                        Signal::Success => tracing::debug!("Found success indicator"),
                        Signal::ManualVerificationPending => {
                            tracing::info!("Phase requires manual verification");
                            tracing::info!(
                                "Auto-confirming manual verification in automated mode"
                            );
                            if let Some(ui) = &self.ui {
                                ui.manual_verification(number);
                            }
                        }
                        Signal::None => {}
                    }
                    signals.record(signal);
                    self.echo(text);
                }
                Fragment::ToolUse { name, input } => {
                    if let Some(ui) = &self.ui {
                        ui.show_tool_use(tool_emoji(name), &describe_tool_use(name, input));
                    }
                }
            }
        }
    }

    fn echo(&self, text: &str) {
        match &self.ui {
            Some(ui) => ui.show_text(&truncate_thinking(text, 60), text),
            None if self.settings.verbose => println!("{}", text),
            None => {}
        }
    }
}

/// Prompt for one phase: the template body followed by the plan and phase.
pub fn phase_prompt(template: &str, plan_ref: &str, number: u32) -> String {
    format!("{}\n\nPlan: {}\nPhase: {}", template, plan_ref, number)
}

fn verdict_from(signals: &PhaseSignals) -> PhaseVerdict {
    match signals.last() {
        Some(Signal::Success) => PhaseVerdict::Success(SuccessKind::Completed),
        Some(Signal::ManualVerificationPending) => {
            PhaseVerdict::Success(SuccessKind::ManualVerificationPending)
        }
        Some(Signal::None) | None => PhaseVerdict::Failure(FailureReason::NoSignal),
    }
}
