//! Signal types for phase outcome detection.

use serde::{Deserialize, Serialize};

/// Outcome hint carried by a single chunk of agent text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// The agent reported the phase complete
    Success,
    /// The agent paused for a human to verify the phase
    ManualVerificationPending,
    /// Nothing recognizable
    None,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Success => write!(f, "success"),
            Signal::ManualVerificationPending => write!(f, "manual verification pending"),
            Signal::None => write!(f, "none"),
        }
    }
}

/// Signals observed across one phase's agent stream.
///
/// Only the most recent non-`None` signal and some counters are kept; the
/// text itself is never retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSignals {
    last: Option<Signal>,
    /// Text fragments classified
    pub fragments: usize,
    /// Fragments that yielded `Success`
    pub successes: usize,
    /// Fragments that yielded `ManualVerificationPending`
    pub manual_requests: usize,
}

impl PhaseSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the classification of one fragment.
    pub fn record(&mut self, signal: Signal) {
        self.fragments += 1;
        match signal {
            Signal::Success => self.successes += 1,
            Signal::ManualVerificationPending => self.manual_requests += 1,
            Signal::None => return,
        }
        self.last = Some(signal);
    }

    /// The last non-`None` signal seen, if any.
    pub fn last(&self) -> Option<Signal> {
        self.last
    }

    /// Whether the stream carried anything that counts as phase success.
    pub fn is_satisfied(&self) -> bool {
        self.last.is_some()
    }

    /// Get a summary string for logging.
    pub fn summary(&self) -> String {
        if self.fragments == 0 {
            return "no text received".to_string();
        }
        format!(
            "{} fragment{}, {} success, {} manual verification",
            self.fragments,
            if self.fragments == 1 { "" } else { "s" },
            self.successes,
            self.manual_requests
        )
    }
}
