use serde::Deserialize;
use serde_json::Value;

use crate::agent::{AgentMessage, Fragment, Role};

/// Events from Claude CLI's stream-json output format
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "assistant")]
    Assistant {
        message: EventMessage,
        #[serde(default)]
        session_id: Option<String>,
    },

    #[serde(rename = "user")]
    User {
        #[serde(default)]
        message: Option<EventMessage>,
        #[serde(default)]
        session_id: Option<String>,
    },

    #[serde(rename = "result")]
    Result {
        subtype: String,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        session_id: Option<String>,
    },

    #[serde(rename = "system")]
    System {
        subtype: String,
        #[serde(default)]
        session_id: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse {
        name: String,
        input: Value,
        #[serde(default)]
        id: String,
    },

    #[serde(rename = "text")]
    Text { text: String },

    /// Thinking, tool results and anything newer
    #[serde(other)]
    Other,
}

/// Parse one stdout line. Blank and non-JSON lines yield `None`.
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}

fn fragments(message: Option<EventMessage>) -> Vec<Fragment> {
    message
        .map(|m| m.content)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(Fragment::Text(text)),
            ContentBlock::ToolUse { name, input, .. } => Some(Fragment::ToolUse { name, input }),
            ContentBlock::Other => None,
        })
        .collect()
}

impl From<StreamEvent> for AgentMessage {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::Assistant {
                message,
                session_id,
            } => AgentMessage {
                role: Role::Assistant,
                fragments: fragments(Some(message)),
                session_id,
                is_error: false,
            },
            StreamEvent::User {
                message,
                session_id,
            } => AgentMessage {
                role: Role::User,
                fragments: fragments(message),
                session_id,
                is_error: false,
            },
            StreamEvent::Result {
                result,
                is_error,
                session_id,
                ..
            } => AgentMessage {
                role: Role::Result,
                fragments: result.map(Fragment::Text).into_iter().collect(),
                session_id,
                is_error,
            },
            StreamEvent::System { session_id, .. } => AgentMessage {
                role: Role::System,
                fragments: Vec::new(),
                session_id,
                is_error: false,
            },
        }
    }
}

/// Extract a human-readable description from a tool use event
pub fn describe_tool_use(name: &str, input: &Value) -> String {
    let path = || {
        input
            .get("file_path")
            .and_then(|v| v.as_str())
            .map(shorten_path)
            .unwrap_or_else(|| "file".to_string())
    };
    match name {
        "Read" => format!("Reading: {}", path()),
        "Write" => format!("Creating: {}", path()),
        "Edit" | "MultiEdit" => format!("Editing: {}", path()),
        "Bash" => {
            let cmd = input
                .get("command")
                .and_then(|v| v.as_str())
                .map(|s| truncate_str(s, 40))
                .unwrap_or_else(|| "command".to_string());
            format!("Running: {}", cmd)
        }
        "Glob" => {
            let pattern = input.get("pattern").and_then(|v| v.as_str()).unwrap_or("*");
            format!("Searching: {}", pattern)
        }
        "Grep" => {
            let pattern = input
                .get("pattern")
                .and_then(|v| v.as_str())
                .map(|s| truncate_str(s, 30))
                .unwrap_or_else(|| "pattern".to_string());
            format!("Grep: {}", pattern)
        }
        "Task" => {
            let desc = input
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("subagent");
            format!("Agent: {}", desc)
        }
        "TodoWrite" => "Updating todo list".to_string(),
        _ => name.to_string(),
    }
}

/// Get an emoji for a tool
pub fn tool_emoji(name: &str) -> &'static str {
    match name {
        "Read" => "\u{1F4D6}",
        "Write" => "\u{1F4DD}",
        "Edit" | "MultiEdit" => "\u{270F}\u{FE0F}",
        "Bash" => "\u{2699}\u{FE0F}",
        "Glob" => "\u{1F50D}",
        "Grep" => "\u{1F50E}",
        "Task" => "\u{1F916}",
        _ => "\u{1F527}",
    }
}

/// Shorten a file path to just the last 2 components
fn shorten_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() <= 2 {
        path.to_string()
    } else {
        parts[parts.len() - 2..].join("/")
    }
}

/// Truncate a string with ellipsis, respecting char boundaries
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate thinking text to a reasonable snippet
pub fn truncate_thinking(text: &str, max_len: usize) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    truncate_str(first_line.trim(), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assistant_tool_use() {
        let json = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read","input":{"file_path":"/foo/bar.rs"},"id":"123"}]},"session_id":"abc"}"#;
        let msg: AgentMessage = parse_line(json).unwrap().into();

        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.session_id.as_deref(), Some("abc"));
        match &msg.fragments[0] {
            Fragment::ToolUse { name, input } => {
                assert_eq!(name, "Read");
                assert_eq!(input["file_path"], "/foo/bar.rs");
            }
            other => panic!("Expected ToolUse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_assistant_text() {
        let json = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Phase 1 Complete"}]},"session_id":"abc"}"#;
        let msg: AgentMessage = parse_line(json).unwrap().into();
        assert_eq!(msg.texts().collect::<Vec<_>>(), vec!["Phase 1 Complete"]);
    }

    #[test]
    fn test_unknown_content_blocks_are_dropped() {
        let json = r#"{"type":"assistant","message":{"content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"hi"}]}}"#;
        let msg: AgentMessage = parse_line(json).unwrap().into();
        assert_eq!(msg.fragments.len(), 1);
        assert!(msg.session_id.is_none());
    }

    #[test]
    fn test_parse_result_event() {
        let json = r#"{"type":"result","subtype":"success","result":"done","is_error":false,"session_id":"s-1"}"#;
        let msg: AgentMessage = parse_line(json).unwrap().into();
        assert_eq!(msg.role, Role::Result);
        assert_eq!(msg.texts().collect::<Vec<_>>(), vec!["done"]);
        assert!(!msg.is_error);
    }

    #[test]
    fn test_parse_system_and_user_events() {
        let system: AgentMessage = parse_line(r#"{"type":"system","subtype":"init","session_id":"s-2"}"#)
            .unwrap()
            .into();
        assert_eq!(system.role, Role::System);
        assert_eq!(system.session_id.as_deref(), Some("s-2"));

        let user: AgentMessage = parse_line(
            r#"{"type":"user","message":{"content":[{"type":"tool_result","content":"ok"}]}}"#,
        )
        .unwrap()
        .into();
        assert_eq!(user.role, Role::User);
        assert!(user.fragments.is_empty());
    }

    #[test]
    fn test_parse_line_rejects_noise() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("warning: something on stdout").is_none());
        assert!(parse_line(r#"{"type":"unknown"}"#).is_none());
    }

    #[test]
    fn test_describe_tool_use() {
        let input = serde_json::json!({"file_path": "/Users/foo/project/src/main.rs"});
        assert_eq!(describe_tool_use("Read", &input), "Reading: src/main.rs");

        let input = serde_json::json!({"command": "cargo test --release"});
        assert_eq!(
            describe_tool_use("Bash", &input),
            "Running: cargo test --release"
        );
    }

    #[test]
    fn test_truncate_str_handles_multibyte() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_truncate_thinking_takes_first_line() {
        assert_eq!(truncate_thinking("  first line  \nsecond", 60), "first line");
    }
}
