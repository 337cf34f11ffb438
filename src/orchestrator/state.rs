use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::RunError;

/// How a phase succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessKind {
    /// Every automated check was already ticked; the agent was not contacted
    AlreadyComplete,
    /// The agent reported the phase complete
    Completed,
    /// The agent stopped for manual verification, which was auto-confirmed
    ManualVerificationPending,
    /// Nothing was executed
    DryRun,
}

/// Why a phase failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The stream ended without a success or manual verification signal
    NoSignal,
    /// The phase ran past its time limit
    TimedOut(Duration),
    /// The agent could not be started or its stream broke
    Agent(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NoSignal => write!(f, "no completion signal from agent"),
            FailureReason::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            FailureReason::Agent(msg) => write!(f, "agent error: {}", msg),
        }
    }
}

/// Outcome of driving one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseVerdict {
    Success(SuccessKind),
    Failure(FailureReason),
}

impl PhaseVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, PhaseVerdict::Success(_))
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            PhaseVerdict::Failure(reason) => Some(reason),
            PhaseVerdict::Success(_) => None,
        }
    }
}

/// Position of a run in its phase sequence.
///
/// ```text
/// Pending -> Running(0) -> Running(1) -> ... -> Completed
///                 \              \
///                  Stopped(0)     Stopped(1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running(usize),
    Stopped(usize),
    Completed,
}

impl RunState {
    /// Begin a run of `total` phases. An empty run completes at once.
    pub fn start(self, total: usize) -> Result<Self, RunError> {
        match self {
            RunState::Pending if total == 0 => Ok(RunState::Completed),
            RunState::Pending => Ok(RunState::Running(0)),
            other => Err(other.invalid("start")),
        }
    }

    /// The current phase succeeded; move to the next one or finish.
    pub fn advance(self, total: usize) -> Result<Self, RunError> {
        match self {
            RunState::Running(i) if i + 1 < total => Ok(RunState::Running(i + 1)),
            RunState::Running(_) => Ok(RunState::Completed),
            other => Err(other.invalid("advance")),
        }
    }

    /// The current phase failed.
    pub fn stop(self) -> Result<Self, RunError> {
        match self {
            RunState::Running(i) => Ok(RunState::Stopped(i)),
            other => Err(other.invalid("stop")),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Stopped(_) | RunState::Completed)
    }

    /// Index of the phase being executed, if any.
    pub fn current(self) -> Option<usize> {
        match self {
            RunState::Running(i) => Some(i),
            _ => None,
        }
    }

    fn invalid(self, event: &'static str) -> RunError {
        RunError::InvalidTransition {
            from: format!("{:?}", self),
            event,
        }
    }
}

/// Result of one phase in a run.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    pub number: u32,
    pub name: String,
    pub verdict: PhaseVerdict,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every selected phase succeeded
    Completed,
    /// A phase failed and the remaining phases were not attempted
    Stopped {
        number: u32,
        name: String,
        reason: FailureReason,
    },
}

/// Everything that happened during one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub plan_path: PathBuf,
    pub records: Vec<PhaseRecord>,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// Numbers of the phases the agent was asked to implement.
    pub fn attempted(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter(|r| {
                !matches!(
                    r.verdict,
                    PhaseVerdict::Success(SuccessKind::AlreadyComplete | SuccessKind::DryRun)
                )
            })
            .map(|r| r.number)
            .collect()
    }

    pub fn count(&self, kind: SuccessKind) -> usize {
        self.records
            .iter()
            .filter(|r| r.verdict == PhaseVerdict::Success(kind))
            .count()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
