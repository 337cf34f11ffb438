//! A conversation with the agent that survives across prompts.
//!
//! Each prompt is a separate agent invocation; continuity comes from passing
//! the session id reported by the previous response back as `resume`.

use futures::StreamExt;
use std::sync::Arc;

use crate::agent::{Agent, AgentMessage, QueryOptions};
use crate::errors::AgentError;

/// A command typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Create,
    Implement,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim().to_lowercase();
        match input.as_str() {
            "create" => ReplCommand::Create,
            "implement" => ReplCommand::Implement,
            "quit" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(input),
        }
    }
}

/// Which phases an interactive `implement` covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseChoice {
    All,
    Number(u32),
}

impl std::str::FromStr for PhaseChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PhaseChoice::All);
        }
        s.parse::<u32>()
            .map(PhaseChoice::Number)
            .map_err(|_| anyhow::anyhow!("Invalid phase '{}'. Enter a number or 'all'", s))
    }
}

/// `/<command> <description>`
pub fn create_prompt(command: &str, description: &str) -> String {
    format!("/{} {}", command, description)
}

/// `/<command> <plan>` or `/<command> <plan> phase <n>`
pub fn implement_prompt(command: &str, plan_path: &str, phase: PhaseChoice) -> String {
    match phase {
        PhaseChoice::All => format!("/{} {}", command, plan_path),
        PhaseChoice::Number(n) => format!("/{} {} phase {}", command, plan_path, n),
    }
}

pub struct Session {
    agent: Arc<dyn Agent>,
    options: QueryOptions,
}

impl Session {
    pub fn new(agent: Arc<dyn Agent>, system_prompt: impl Into<String>, max_turns: u32) -> Self {
        Self {
            agent,
            options: QueryOptions {
                system_prompt: Some(system_prompt.into()),
                max_turns: Some(max_turns),
                ..QueryOptions::default()
            },
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.options.resume.as_deref()
    }

    /// Send one prompt and hand each response message to `on_message`.
    ///
    /// The latest session id seen in the response is kept for the next call.
    pub async fn send<F>(&mut self, prompt: &str, mut on_message: F) -> Result<(), AgentError>
    where
        F: FnMut(&AgentMessage),
    {
        let mut stream = self.agent.query(prompt, &self.options).await?;
        while let Some(message) = stream.next().await {
            let message = message?;
            if let Some(id) = &message.session_id {
                if self.options.resume.as_deref() != Some(id.as_str()) {
                    tracing::debug!(session_id = %id, "agent session");
                    self.options.resume = Some(id.clone());
                }
            }
            on_message(&message);
        }
        Ok(())
    }
}
