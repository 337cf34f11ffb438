//! `autoplan --interactive`: a create/implement/quit loop over one agent session.

use anyhow::Result;
use dialoguer::{Input, theme::ColorfulTheme};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use autoplan::agent::{Agent, AgentMessage, Fragment, Role};
use autoplan::config::AutoplanToml;
use autoplan::errors::RunError;
use autoplan::session::{PhaseChoice, ReplCommand, Session, create_prompt, implement_prompt};
use autoplan::stream::{describe_tool_use, tool_emoji};

use super::prompt::blocking_prompt;

pub async fn cmd_interactive(
    config: &AutoplanToml,
    agent: Arc<dyn Agent>,
    cancel: &CancellationToken,
) -> Result<()> {
    tracing::info!("Starting interactive mode...");
    let mut session = Session::new(agent, config.agent.system_prompt.clone(), config.agent.max_turns);

    loop {
        println!();
        let line = ask(cancel, "Command (create/implement/quit)").await?;
        let prompt = match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Create => {
                let task = ask(cancel, "Task description").await?;
                create_prompt(&config.templates.create, &task)
            }
            ReplCommand::Implement => {
                let plan_path = ask(cancel, "Plan path").await?;
                let phase = loop {
                    let answer = ask(cancel, "Phase number (or 'all')").await?;
                    match answer.parse::<PhaseChoice>() {
                        Ok(choice) => break choice,
                        Err(e) => println!("{}", e),
                    }
                };
                implement_prompt(&config.templates.implement, &plan_path, phase)
            }
            ReplCommand::Unknown(_) => {
                println!("Unknown command");
                continue;
            }
        };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RunError::Interrupted { phase: None }.into()),
            sent = session.send(&prompt, print_message) => sent,
        };
        if let Err(e) = sent {
            tracing::error!("Agent error: {}", e);
        }
    }
    Ok(())
}

async fn ask(cancel: &CancellationToken, prompt: &'static str) -> Result<String> {
    let answer: String = blocking_prompt(cancel, move || {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await?;
    Ok(answer.trim().to_string())
}

fn print_message(message: &AgentMessage) {
    // the result event repeats the final assistant text
    if message.role == Role::Result {
        return;
    }
    for fragment in &message.fragments {
        match fragment {
            Fragment::Text(text) => println!("{}", text),
            Fragment::ToolUse { name, input } => {
                println!("    {} {}", tool_emoji(name), describe_tool_use(name, input))
            }
        }
    }
}
