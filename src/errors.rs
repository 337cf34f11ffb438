//! Typed error hierarchy for autoplan.
//!
//! Four enums cover the subsystems:
//! - `PlanError`: reading and parsing the plan document
//! - `TemplateError`: locating command templates
//! - `AgentError`: talking to the agent process
//! - `RunError`: anything that aborts a whole run

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading a plan document.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Plan file not found: {}", path.display())]
    DocumentNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read plan file {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No phases found in plan {}", path.display())]
    NoPhasesFound { path: PathBuf },
}

/// Errors from resolving a command template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Slash command not found: {name} (searched {})", display_paths(searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("Failed to read command template at {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the agent collaborator.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to spawn agent command '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Agent stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Agent exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Interrupted by user{}", phase.map(|n| format!(" during phase {n}")).unwrap_or_default())]
    Interrupted { phase: Option<u32> },

    #[error("Invalid run state transition: {event} from {from}")]
    InvalidTransition { from: String, event: &'static str },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
