//! Configuration for autoplan.
//!
//! Settings come from `autoplan.toml` in the project directory (or the file
//! given with `--config`), then environment variables, then CLI flags.
//! Every key is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! [agent]
//! command = "claude"        # AUTOPLAN_CLAUDE_CMD / CLAUDE_CMD take precedence
//! permission_mode = "bypassPermissions"
//! timeout_secs = 1800
//! max_turns = 100
//!
//! [run]
//! order = "numeric"
//! phase_pause_secs = 1
//! missing_verification = "complete"
//!
//! [signals]
//! success_tokens = ["Phase", "Complete"]
//! manual_verification_phrase = "Ready for Manual Verification"
//!
//! [templates]
//! implement = "implement_plan"
//! create = "create_plan"
//! dirs = ["prompts/commands"]
//! plans_dir = "thoughts/shared/plans"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::PermissionMode;
use crate::orchestrator::{DriverSettings, RunSettings};
use crate::plan::{MissingVerification, PhaseOrder};
use crate::signals::KeywordClassifier;
use crate::templates::{CREATE_COMMAND, IMPLEMENT_COMMAND};

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE: &str = "autoplan.toml";

/// Default system prompt for interactive sessions.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant for software implementation tasks.";

/// Agent process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Agent executable (default: "claude")
    #[serde(default)]
    pub command: Option<String>,
    /// Permission mode for plan phases
    #[serde(default = "default_permission_mode")]
    pub permission_mode: PermissionMode,
    /// Per-phase time limit; unset means no limit
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// System prompt for interactive sessions
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Turn limit for interactive sessions
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_permission_mode() -> PermissionMode {
    PermissionMode::BypassPermissions
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_max_turns() -> u32 {
    100
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            command: None,
            permission_mode: default_permission_mode(),
            timeout_secs: None,
            system_prompt: default_system_prompt(),
            max_turns: default_max_turns(),
        }
    }
}

/// Run loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    /// Execution order of selected phases
    #[serde(default)]
    pub order: PhaseOrder,
    /// Pause between phases, in seconds
    #[serde(default = "default_phase_pause_secs")]
    pub phase_pause_secs: u64,
    /// Completion of phases without an automated verification section
    #[serde(default)]
    pub missing_verification: MissingVerification,
}

fn default_phase_pause_secs() -> u64 {
    1
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            order: PhaseOrder::default(),
            phase_pause_secs: default_phase_pause_secs(),
            missing_verification: MissingVerification::default(),
        }
    }
}

/// Command template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesSection {
    /// Command used to implement a phase
    #[serde(default = "default_implement")]
    pub implement: String,
    /// Command used to create a plan
    #[serde(default = "default_create")]
    pub create: String,
    /// Directories searched before the standard command directories
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    /// Where created plans are written, used to spot the new plan's path
    #[serde(default = "default_plans_dir")]
    pub plans_dir: String,
}

fn default_implement() -> String {
    IMPLEMENT_COMMAND.to_string()
}

fn default_create() -> String {
    CREATE_COMMAND.to_string()
}

fn default_plans_dir() -> String {
    "thoughts/shared/plans".to_string()
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            implement: default_implement(),
            create: default_create(),
            dirs: Vec::new(),
            plans_dir: default_plans_dir(),
        }
    }
}

/// The complete autoplan.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoplanToml {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub signals: KeywordClassifier,
    #[serde(default)]
    pub templates: TemplatesSection,
}

impl AutoplanToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse autoplan.toml")
    }

    /// Load `autoplan.toml` from `dir`, or defaults if it does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Agent command: `AUTOPLAN_CLAUDE_CMD`, then `CLAUDE_CMD`, then the
    /// file's `agent.command`, then `claude`.
    pub fn claude_cmd(&self) -> String {
        self.resolve_claude_cmd(|key| std::env::var(key).ok())
    }

    fn resolve_claude_cmd(&self, env: impl Fn(&str) -> Option<String>) -> String {
        env("AUTOPLAN_CLAUDE_CMD")
            .or_else(|| env("CLAUDE_CMD"))
            .filter(|cmd| !cmd.is_empty())
            .or_else(|| self.agent.command.clone())
            .unwrap_or_else(|| "claude".to_string())
    }

    /// Apply command line overrides on top of file values.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(secs) = overrides.timeout_secs {
            self.agent.timeout_secs = Some(secs);
        }
        if let Some(order) = overrides.order {
            self.run.order = order;
        }
        if overrides.strict_verification {
            self.run.missing_verification = MissingVerification::Incomplete;
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            order: self.run.order,
            phase_pause: Duration::from_secs(self.run.phase_pause_secs),
            missing_verification: self.run.missing_verification,
        }
    }

    pub fn driver_settings(&self, dry_run: bool, verbose: bool) -> DriverSettings {
        DriverSettings {
            implement_command: self.templates.implement.clone(),
            permission_mode: self.agent.permission_mode,
            // zero means no limit
            timeout: self
                .agent
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            dry_run,
            verbose,
        }
    }
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub timeout_secs: Option<u64>,
    pub order: Option<PhaseOrder>,
    pub strict_verification: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AutoplanToml::parse("").unwrap();
        assert_eq!(config.agent.permission_mode, PermissionMode::BypassPermissions);
        assert_eq!(config.agent.timeout_secs, None);
        assert_eq!(config.agent.max_turns, 100);
        assert_eq!(config.agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.run.order, PhaseOrder::Numeric);
        assert_eq!(config.run.phase_pause_secs, 1);
        assert_eq!(config.run.missing_verification, MissingVerification::Complete);
        assert_eq!(config.signals, KeywordClassifier::default());
        assert_eq!(config.templates.implement, "implement_plan");
        assert_eq!(config.templates.create, "create_plan");
        assert_eq!(config.templates.plans_dir, "thoughts/shared/plans");
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
            [agent]
            command = "/opt/claude"
            permission_mode = "acceptEdits"
            timeout_secs = 600

            [run]
            order = "document"
            phase_pause_secs = 0
            missing_verification = "incomplete"

            [signals]
            success_tokens = ["DONE"]

            [templates]
            implement = "run_phase"
            dirs = ["prompts"]
        "#;
        let config = AutoplanToml::parse(content).unwrap();
        assert_eq!(config.resolve_claude_cmd(|_| None), "/opt/claude");
        assert_eq!(config.agent.permission_mode, PermissionMode::AcceptEdits);
        assert_eq!(config.run.order, PhaseOrder::Document);
        assert_eq!(
            config.run.missing_verification,
            MissingVerification::Incomplete
        );
        assert_eq!(config.signals.success_tokens, vec!["DONE"]);
        assert_eq!(
            config.signals.manual_verification_phrase,
            "Ready for Manual Verification"
        );
        assert_eq!(config.templates.implement, "run_phase");
        assert_eq!(config.templates.dirs, vec![PathBuf::from("prompts")]);

        let driver = config.driver_settings(false, true);
        assert_eq!(driver.timeout, Some(Duration::from_secs(600)));
        assert_eq!(driver.implement_command, "run_phase");
        assert!(driver.verbose);

        let run = config.run_settings();
        assert_eq!(run.phase_pause, Duration::ZERO);
    }

    #[test]
    fn test_env_command_overrides_file() {
        let config = AutoplanToml::parse("[agent]\ncommand = \"claude\"\n").unwrap();
        let env = |key: &str| (key == "AUTOPLAN_CLAUDE_CMD").then(|| "/tmp/fake-agent".to_string());
        assert_eq!(config.resolve_claude_cmd(env), "/tmp/fake-agent");

        let env = |key: &str| (key == "CLAUDE_CMD").then(|| "/usr/local/bin/claude".to_string());
        assert_eq!(config.resolve_claude_cmd(env), "/usr/local/bin/claude");
    }

    #[test]
    fn test_command_falls_back_to_claude() {
        let config = AutoplanToml::parse("").unwrap();
        assert_eq!(config.resolve_claude_cmd(|_| None), "claude");
        assert_eq!(config.resolve_claude_cmd(|_| Some(String::new())), "claude");
    }

    #[test]
    fn test_zero_timeout_means_no_limit() {
        let mut config = AutoplanToml::parse("[agent]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.driver_settings(false, false).timeout, None);

        config.apply_overrides(&Overrides {
            timeout_secs: Some(0),
            ..Overrides::default()
        });
        assert_eq!(config.driver_settings(false, false).timeout, None);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = AutoplanToml::parse("[run]\norder = \"sideways\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = AutoplanToml::load_or_default(dir.path()).unwrap();
        assert_eq!(config.run.order, PhaseOrder::Numeric);
    }

    #[test]
    fn test_load_or_default_reads_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[run]\nphase_pause_secs = 7\n",
        )
        .unwrap();
        let config = AutoplanToml::load_or_default(dir.path()).unwrap();
        assert_eq!(config.run.phase_pause_secs, 7);
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "not = [valid").unwrap();
        let err = AutoplanToml::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = AutoplanToml::parse("[run]\norder = \"document\"\n").unwrap();
        config.apply_overrides(&Overrides {
            timeout_secs: Some(30),
            order: Some(PhaseOrder::Numeric),
            strict_verification: true,
        });
        assert_eq!(config.agent.timeout_secs, Some(30));
        assert_eq!(config.run.order, PhaseOrder::Numeric);
        assert_eq!(
            config.run.missing_verification,
            MissingVerification::Incomplete
        );
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let mut config = AutoplanToml::parse("[agent]\ntimeout_secs = 9\n").unwrap();
        config.apply_overrides(&Overrides::default());
        assert_eq!(config.agent.timeout_secs, Some(9));
        assert_eq!(config.run.missing_verification, MissingVerification::Complete);
    }
}
