//! Phase extraction from plan markdown.
//!
//! A phase starts at a level-2 heading of the form `## Phase <n>: <name>` and
//! runs until the next such heading or the end of the document.

use regex::Regex;
use std::sync::LazyLock;

use super::Phase;
use super::verification::MissingVerification;

static PHASE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^## Phase (\d+):\s*(.+?)$").unwrap());

/// Match a phase heading line, returning its number and trimmed name.
///
/// Numbers that overflow `u32` do not count as headings.
pub fn parse_heading(line: &str) -> Option<(u32, String)> {
    let caps = PHASE_HEADING.captures(line)?;
    let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let name = caps.get(2)?.as_str().trim().to_string();
    Some((number, name))
}

/// Split a plan document into phases, in the order they appear.
///
/// Lines before the first heading belong to no phase. An empty result is
/// left for the caller to reject.
pub fn parse_phases(text: &str, policy: MissingVerification) -> Vec<Phase> {
    let mut phases = Vec::new();
    let mut current: Option<(u32, String)> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if let Some(heading) = parse_heading(line) {
            if let Some((number, name)) = current.take() {
                phases.push(Phase::new(number, name, body.join("\n"), policy));
            }
            current = Some(heading);
            body.clear();
        } else if current.is_some() {
            body.push(line);
        }
    }

    if let Some((number, name)) = current {
        phases.push(Phase::new(number, name, body.join("\n"), policy));
    }

    phases
}
