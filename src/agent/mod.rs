//! The agent collaborator.
//!
//! An [`Agent`] accepts a prompt plus [`QueryOptions`] and streams back
//! [`AgentMessage`]s. Each call is an independent conversation unless
//! `resume` names an earlier session.

pub mod claude;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AgentError;

pub use claude::ClaudeCli;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Assistant,
    User,
    System,
    Result,
}

/// One piece of message content.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Text(String),
    ToolUse { name: String, input: Value },
}

/// A single message from the agent stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMessage {
    pub role: Role,
    pub fragments: Vec<Fragment>,
    pub session_id: Option<String>,
    /// Set on result messages that report an error
    pub is_error: bool,
}

impl AgentMessage {
    /// An assistant message carrying one text fragment.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            fragments: vec![Fragment::Text(text.into())],
            session_id: None,
            is_error: false,
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Text(text) => Some(text.as_str()),
            Fragment::ToolUse { .. } => None,
        })
    }
}

/// Permission handling requested from the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Prompt for every sensitive action
    #[default]
    Default,
    /// Auto-accept file edits
    AcceptEdits,
    /// Never prompt; required for unattended runs
    BypassPermissions,
    /// Plan only, no changes
    Plan,
}

impl PermissionMode {
    /// Value for the CLI `--permission-mode` flag.
    pub fn as_arg(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Plan => "plan",
        }
    }
}

impl std::fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Per-query options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub permission_mode: Option<PermissionMode>,
    pub system_prompt: Option<String>,
    pub max_turns: Option<u32>,
    /// Continue an earlier conversation instead of starting fresh
    pub resume: Option<String>,
}

impl QueryOptions {
    /// Options for an unattended run with no confirmation prompts.
    pub fn unattended(mode: PermissionMode) -> Self {
        Self {
            permission_mode: Some(mode),
            ..Self::default()
        }
    }
}

pub type MessageStream = BoxStream<'static, Result<AgentMessage, AgentError>>;

#[async_trait]
pub trait Agent: Send + Sync {
    /// Start a query and return its message stream.
    async fn query(&self, prompt: &str, options: &QueryOptions)
    -> Result<MessageStream, AgentError>;
}
