//! Plan documents and their phases.
//!
//! This module provides:
//! - `Phase` struct representing one `## Phase N: Name` section
//! - `Plan` struct holding every phase of a loaded document
//! - Run-window filtering and execution ordering
//!
//! Completion state is re-derived from the checklists each time a plan is
//! loaded; nothing is written back.

pub mod parser;
pub mod verification;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::PlanError;

pub use parser::{parse_heading, parse_phases};
pub use verification::{
    ChecklistSummary, MissingVerification, checklist_summary, is_phase_completed,
};

/// A single implementation phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    /// Phase number from the heading
    pub number: u32,
    /// Label following the colon
    pub name: String,
    /// Body between this heading and the next
    pub content: String,
    /// Whether no automated verification item is left unchecked
    pub is_completed: bool,
}

impl Phase {
    /// Create a phase, deriving completion from its body.
    pub fn new(
        number: u32,
        name: impl Into<String>,
        content: impl Into<String>,
        policy: MissingVerification,
    ) -> Self {
        let content = content.into();
        let is_completed = is_phase_completed(&content, policy);
        Self {
            number,
            name: name.into(),
            content,
            is_completed,
        }
    }

    pub fn checklist(&self) -> ChecklistSummary {
        checklist_summary(&self.content)
    }
}

/// Order in which selected phases execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseOrder {
    /// Ascending phase number; equal numbers keep document order
    #[default]
    Numeric,
    /// The order headings appear in the document
    Document,
}

impl std::fmt::Display for PhaseOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseOrder::Numeric => write!(f, "numeric"),
            PhaseOrder::Document => write!(f, "document"),
        }
    }
}

impl std::str::FromStr for PhaseOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "numeric" => Ok(PhaseOrder::Numeric),
            "document" => Ok(PhaseOrder::Document),
            _ => anyhow::bail!("Invalid phase order '{}'. Valid values: numeric, document", s),
        }
    }
}

/// Inclusive phase-number bounds for a run. Absent bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunWindow {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl RunWindow {
    pub fn new(start: Option<u32>, end: Option<u32>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, number: u32) -> bool {
        self.start.is_none_or(|s| number >= s) && self.end.is_none_or(|e| number <= e)
    }
}

/// A parsed plan document.
#[derive(Debug, Clone)]
pub struct Plan {
    pub path: PathBuf,
    pub phases: Vec<Phase>,
}

impl Plan {
    /// Read and parse a plan file.
    pub fn load(path: &Path, policy: MissingVerification) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            let path = path.to_path_buf();
            match source.kind() {
                std::io::ErrorKind::NotFound => PlanError::DocumentNotFound { path, source },
                _ => PlanError::ReadFailed { path, source },
            }
        })?;
        Self::parse(path, &text, policy)
    }

    /// Parse plan text. A document without phase headings is an error.
    pub fn parse(path: &Path, text: &str, policy: MissingVerification) -> Result<Self, PlanError> {
        let phases = parse_phases(text, policy);
        if phases.is_empty() {
            return Err(PlanError::NoPhasesFound {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            phases,
        })
    }

    /// Phases inside `window`, arranged by `order`.
    pub fn select(&self, window: RunWindow, order: PhaseOrder) -> Vec<&Phase> {
        let mut selected: Vec<&Phase> = self
            .phases
            .iter()
            .filter(|p| window.contains(p.number))
            .collect();
        if order == PhaseOrder::Numeric {
            // sort_by_key is stable, duplicates stay in document order
            selected.sort_by_key(|p| p.number);
        }
        selected
    }

    pub fn completed_count(&self) -> usize {
        self.phases.iter().filter(|p| p.is_completed).count()
    }
}
