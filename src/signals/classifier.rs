//! Keyword classification of agent output.
//!
//! The agent's prose is the only completion oracle available, so each chunk of
//! text is checked for a few literal phrases:
//! - every success token (default `Phase` and `Complete`) means the phase is done
//! - `Ready for Manual Verification` means it stopped for a human check

use serde::{Deserialize, Serialize};

use super::types::Signal;

pub const DEFAULT_SUCCESS_TOKENS: [&str; 2] = ["Phase", "Complete"];
pub const DEFAULT_MANUAL_PHRASE: &str = "Ready for Manual Verification";

/// Maps one chunk of agent text to a [`Signal`].
///
/// Implementations must be pure: the same text always yields the same signal.
pub trait SignalClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Signal;
}

/// Case-sensitive substring matcher. Success is checked before manual
/// verification, so a chunk yields at most one signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordClassifier {
    /// All of these must appear for `Success`
    #[serde(default = "default_success_tokens")]
    pub success_tokens: Vec<String>,
    /// Phrase for `ManualVerificationPending`
    #[serde(default = "default_manual_phrase")]
    pub manual_verification_phrase: String,
}

fn default_success_tokens() -> Vec<String> {
    DEFAULT_SUCCESS_TOKENS.iter().map(|s| s.to_string()).collect()
}

fn default_manual_phrase() -> String {
    DEFAULT_MANUAL_PHRASE.to_string()
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            success_tokens: default_success_tokens(),
            manual_verification_phrase: default_manual_phrase(),
        }
    }
}

impl SignalClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Signal {
        if !self.success_tokens.is_empty()
            && self.success_tokens.iter().all(|t| text.contains(t.as_str()))
        {
            Signal::Success
        } else if !self.manual_verification_phrase.is_empty()
            && text.contains(&self.manual_verification_phrase)
        {
            Signal::ManualVerificationPending
        } else {
            Signal::None
        }
    }
}

/// Convenience function to classify with the default keywords.
pub fn classify_chunk(text: &str) -> Signal {
    KeywordClassifier::default().classify(text)
}
