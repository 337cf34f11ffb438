//! Outcome signaling for autoplan.
//!
//! This module turns the agent's free-text output into control signals:
//!
//! - `Phase ... Complete` - the phase finished
//! - `Ready for Manual Verification` - the phase stopped for a human check
//!
//! Classification sits behind [`SignalClassifier`] so the keyword heuristic
//! can be replaced without touching the orchestrator.

mod classifier;
mod types;

pub use classifier::{
    DEFAULT_MANUAL_PHRASE, DEFAULT_SUCCESS_TOKENS, KeywordClassifier, SignalClassifier,
    classify_chunk,
};
pub use types::{PhaseSignals, Signal};
