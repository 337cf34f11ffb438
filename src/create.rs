//! Plan creation through the agent's `create_plan` command.

use futures::StreamExt;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::agent::{Agent, PermissionMode, QueryOptions, Role};
use crate::errors::AgentError;
use crate::templates::CREATE_COMMAND;

/// Path reported for a dry run.
pub const DRY_RUN_PLAN: &str = "thoughts/shared/plans/dry-run-plan.md";

pub struct PlanCreator {
    agent: Arc<dyn Agent>,
    command: String,
    path_pattern: Regex,
    permission_mode: PermissionMode,
    dry_run: bool,
    verbose: bool,
}

impl PlanCreator {
    pub fn new(agent: Arc<dyn Agent>, plans_dir: &str) -> Self {
        Self {
            agent,
            command: CREATE_COMMAND.to_string(),
            path_pattern: plan_path_pattern(plans_dir),
            permission_mode: PermissionMode::BypassPermissions,
            dry_run: false,
            verbose: false,
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Ask the agent to write a plan for `description`.
    ///
    /// Returns the last plan path mentioned in the agent's text, or `None` if
    /// it never named one.
    pub async fn create(&self, description: &str) -> Result<Option<PathBuf>, AgentError> {
        tracing::info!("Creating new plan...");

        if self.dry_run {
            tracing::info!("[DRY RUN] Would create plan for: {}", description);
            return Ok(Some(PathBuf::from(DRY_RUN_PLAN)));
        }

        let prompt = format!("/{} {}", self.command, description);
        let options = QueryOptions::unattended(self.permission_mode);
        let mut stream = self.agent.query(&prompt, &options).await?;

        let mut plan_path = None;
        while let Some(message) = stream.next().await {
            let message = message?;
            if message.role != Role::Assistant {
                continue;
            }
            for text in message.texts() {
                if let Some(path) = self.find_plan_path(text) {
                    tracing::info!("Plan created at: {}", path.display());
                    plan_path = Some(path);
                }
                if self.verbose {
                    println!("{}", text);
                }
            }
        }
        Ok(plan_path)
    }

    /// First backtick-quoted markdown path under the plans directory.
    pub fn find_plan_path(&self, text: &str) -> Option<PathBuf> {
        self.path_pattern
            .captures(text)
            .map(|caps| PathBuf::from(&caps[1]))
    }
}

fn plan_path_pattern(plans_dir: &str) -> Regex {
    let dir = regex::escape(plans_dir.trim_end_matches('/'));
    Regex::new(&format!(r"`({}/[^`]+\.md)`", dir)).expect("escaped plan path pattern is valid")
}
