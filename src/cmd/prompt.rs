//! Terminal prompts that give way to Ctrl-C.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use autoplan::errors::RunError;

/// Run a blocking dialoguer prompt off the async runtime.
///
/// Resolves to `Interrupted` if `cancel` fires first.
pub async fn blocking_prompt<T, F>(cancel: &CancellationToken, prompt: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(prompt);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RunError::Interrupted { phase: None }.into()),
        answer = task => {
            let answer = answer.context("Prompt task failed")?;
            answer.context("Failed to read input")
        }
    }
}
