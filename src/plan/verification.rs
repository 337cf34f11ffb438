//! Verification checklist scanning.
//!
//! A phase body may carry two checklist sections:
//!
//! ```text
//! #### Automated Verification:
//! - [x] cargo test passes
//! - [ ] clippy is clean
//!
//! #### Manual Verification:
//! - [ ] feature works in the browser
//! ```
//!
//! Only unchecked items under the automated section gate completion.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const AUTOMATED_MARKER: &str = "#### Automated Verification:";
pub const MANUAL_MARKER: &str = "#### Manual Verification:";

static UNCHECKED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*\[\s*\]\s*(.+)").unwrap());

static CHECKED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*\[x\]\s*(.+)").unwrap());

/// How to treat a phase that has no automated verification section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingVerification {
    /// Nothing unchecked can be found, so the phase counts as complete.
    #[default]
    Complete,
    /// A phase must carry an automated section to count as complete.
    Incomplete,
}

impl std::fmt::Display for MissingVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingVerification::Complete => write!(f, "complete"),
            MissingVerification::Incomplete => write!(f, "incomplete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Automated,
    Manual,
}

/// One meaningful line of a phase body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChecklistLine {
    SectionStart(SectionKind),
    Item {
        section: Option<SectionKind>,
        checked: bool,
    },
}

/// Walk the body and yield section markers and checklist items, tagging each
/// item with the section active at that point.
fn checklist_lines(content: &str) -> impl Iterator<Item = ChecklistLine> + '_ {
    let mut active: Option<SectionKind> = None;
    content.split('\n').filter_map(move |line| {
        if line.contains(AUTOMATED_MARKER) {
            active = Some(SectionKind::Automated);
            Some(ChecklistLine::SectionStart(SectionKind::Automated))
        } else if line.contains(MANUAL_MARKER) {
            active = Some(SectionKind::Manual);
            Some(ChecklistLine::SectionStart(SectionKind::Manual))
        } else if UNCHECKED_ITEM.is_match(line) {
            Some(ChecklistLine::Item {
                section: active,
                checked: false,
            })
        } else if CHECKED_ITEM.is_match(line) {
            Some(ChecklistLine::Item {
                section: active,
                checked: true,
            })
        } else {
            None
        }
    })
}

/// Decide whether a phase body is complete.
///
/// Stops at the first unchecked automated item.
pub fn is_phase_completed(content: &str, policy: MissingVerification) -> bool {
    let mut saw_automated = false;
    for line in checklist_lines(content) {
        match line {
            ChecklistLine::SectionStart(SectionKind::Automated) => saw_automated = true,
            ChecklistLine::Item {
                section: Some(SectionKind::Automated),
                checked: false,
            } => return false,
            _ => {}
        }
    }
    saw_automated || policy == MissingVerification::Complete
}

/// Checklist counts for a phase body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChecklistSummary {
    pub has_automated_section: bool,
    pub has_manual_section: bool,
    pub automated_checked: usize,
    pub automated_unchecked: usize,
    pub manual_checked: usize,
    pub manual_unchecked: usize,
}

impl ChecklistSummary {
    pub fn automated_total(&self) -> usize {
        self.automated_checked + self.automated_unchecked
    }

    pub fn manual_total(&self) -> usize {
        self.manual_checked + self.manual_unchecked
    }
}

/// Count checklist items per section. Items outside any section are ignored.
pub fn checklist_summary(content: &str) -> ChecklistSummary {
    let mut summary = ChecklistSummary::default();
    for line in checklist_lines(content) {
        match line {
            ChecklistLine::SectionStart(SectionKind::Automated) => {
                summary.has_automated_section = true
            }
            ChecklistLine::SectionStart(SectionKind::Manual) => summary.has_manual_section = true,
            ChecklistLine::Item {
                section: Some(SectionKind::Automated),
                checked,
            } => {
                if checked {
                    summary.automated_checked += 1;
                } else {
                    summary.automated_unchecked += 1;
                }
            }
            ChecklistLine::Item {
                section: Some(SectionKind::Manual),
                checked,
            } => {
                if checked {
                    summary.manual_checked += 1;
                } else {
                    summary.manual_unchecked += 1;
                }
            }
            ChecklistLine::Item { section: None, .. } => {}
        }
    }
    summary
}
