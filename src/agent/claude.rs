//! [`Agent`] backed by the `claude` command line tool.
//!
//! The prompt is written to stdin and stdout is read as stream-json, one
//! event per line.

use async_trait::async_trait;
use futures::StreamExt;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::{Agent, AgentMessage, MessageStream, QueryOptions};
use crate::errors::AgentError;
use crate::stream::parse_line;

#[derive(Debug, Clone)]
pub struct ClaudeCli {
    command: String,
}

impl ClaudeCli {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Command line flags for a query.
    pub fn args(&self, options: &QueryOptions) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];
        if let Some(mode) = options.permission_mode {
            args.push("--permission-mode".to_string());
            args.push(mode.as_arg().to_string());
        }
        if let Some(ref prompt) = options.system_prompt {
            args.push("--system-prompt".to_string());
            args.push(prompt.clone());
        }
        if let Some(turns) = options.max_turns {
            args.push("--max-turns".to_string());
            args.push(turns.to_string());
        }
        if let Some(ref session) = options.resume {
            args.push("--resume".to_string());
            args.push(session.clone());
        }
        args
    }
}

#[async_trait]
impl Agent for ClaudeCli {
    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<MessageStream, AgentError> {
        let args = self.args(options);
        tracing::debug!(command = %self.command, args = ?args, "spawning agent");

        let mut cmd = Command::new(&self.command);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| AgentError::SpawnFailed {
            command: self.command.clone(),
            source,
        })?;
        tracing::debug!(pid = child.id().unwrap_or(0), "agent process spawned");

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let stdout = child.stdout.take().ok_or_else(|| {
            AgentError::Io(std::io::Error::other("agent stdout was not captured"))
        })?;
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = String::new();
                pipe.read_to_string(&mut buf).await.ok();
                buf
            })
        });

        let state = CliStream {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr,
            done: false,
        };
        Ok(futures::stream::unfold(state, next_message).boxed())
    }
}

struct CliStream {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
    done: bool,
}

async fn next_message(
    mut state: CliStream,
) -> Option<(Result<AgentMessage, AgentError>, CliStream)> {
    if state.done {
        return None;
    }
    loop {
        match state.lines.next_line().await {
            Ok(Some(line)) => match parse_line(&line) {
                Some(event) => return Some((Ok(event.into()), state)),
                None => {
                    if !line.trim().is_empty() {
                        tracing::debug!(line = %line, "skipping non-event output");
                    }
                }
            },
            Ok(None) => {
                state.done = true;
                return finish(state).await;
            }
            Err(e) => {
                state.done = true;
                return Some((Err(AgentError::Io(e)), state));
            }
        }
    }
}

/// Reap the child once stdout closes; a failing exit becomes a trailing error.
async fn finish(mut state: CliStream) -> Option<(Result<AgentMessage, AgentError>, CliStream)> {
    let status = match state.child.wait().await {
        Ok(status) => status,
        Err(e) => return Some((Err(AgentError::Io(e)), state)),
    };
    if status.success() {
        return None;
    }
    let stderr = match state.stderr.take() {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };
    let code = status.code().unwrap_or(-1);
    Some((
        Err(AgentError::NonZeroExit {
            code,
            stderr: stderr.trim().to_string(),
        }),
        state,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PermissionMode;

    #[test]
    fn test_args_for_unattended_query() {
        let cli = ClaudeCli::new("claude");
        let args = cli.args(&QueryOptions::unattended(PermissionMode::BypassPermissions));
        assert_eq!(
            args,
            vec![
                "--print",
                "--output-format",
                "stream-json",
                "--verbose",
                "--permission-mode",
                "bypassPermissions"
            ]
        );
    }

    #[test]
    fn test_args_include_session_options() {
        let cli = ClaudeCli::new("claude");
        let options = QueryOptions {
            permission_mode: None,
            system_prompt: Some("be helpful".into()),
            max_turns: Some(100),
            resume: Some("sess-1".into()),
        };
        let args = cli.args(&options);
        let joined = args.join(" ");
        assert!(joined.contains("--system-prompt be helpful"));
        assert!(joined.contains("--max-turns 100"));
        assert!(joined.contains("--resume sess-1"));
        assert!(!joined.contains("--permission-mode"));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let cli = ClaudeCli::new("/nonexistent/definitely-not-claude");
        let result = cli.query("hi", &QueryOptions::default()).await;
        assert!(matches!(result, Err(AgentError::SpawnFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streams_events_from_process() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-claude.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\ncat > /dev/null\necho 'not json'\necho '{\"type\":\"assistant\",\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"Phase 1 Complete\"}]}}'\n",
        )
        .unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cli = ClaudeCli::new(script.to_string_lossy().to_string());
        let stream = cli.query("prompt", &QueryOptions::default()).await.unwrap();
        let messages: Vec<_> = stream.collect().await;

        assert_eq!(messages.len(), 1);
        let msg = messages[0].as_ref().unwrap();
        assert_eq!(msg.texts().collect::<Vec<_>>(), vec!["Phase 1 Complete"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_trailing_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("failing-claude.sh");
        std::fs::write(&script, "#!/bin/sh\ncat > /dev/null\necho boom >&2\nexit 3\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cli = ClaudeCli::new(script.to_string_lossy().to_string());
        let stream = cli.query("prompt", &QueryOptions::default()).await.unwrap();
        let messages: Vec<_> = stream.collect().await;

        assert_eq!(messages.len(), 1);
        match &messages[0] {
            Err(AgentError::NonZeroExit { code, stderr }) => {
                assert_eq!(*code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("Expected NonZeroExit, got {:?}", other),
        }
    }
}
