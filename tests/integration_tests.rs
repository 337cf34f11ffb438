//! Integration tests for autoplan
//!
//! These tests drive the binary end to end. Agent-backed runs use a small
//! shell script that speaks the stream-json protocol in place of `claude`.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create an autoplan Command
fn autoplan() -> Command {
    cargo_bin_cmd!("autoplan")
}

const THREE_PHASES: &str = "# Feature Plan

## Phase 1: Setup
#### Automated Verification:
- [x] cargo build passes

## Phase 2: Core
#### Automated Verification:
- [ ] cargo test passes
#### Manual Verification:
- [ ] works in the UI

## Phase 3: Polish
#### Automated Verification:
- [ ] cargo clippy is clean
";

/// Temp project with a plan, a command template and no inter-phase pause.
fn create_project(plan: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("plan.md"), plan).unwrap();
    fs::create_dir_all(dir.path().join(".claude/commands")).unwrap();
    fs::write(
        dir.path().join(".claude/commands/implement_plan.md"),
        "---\ndescription: Implement a plan\n---\nImplement the plan.",
    )
    .unwrap();
    fs::write(
        dir.path().join("autoplan.toml"),
        "[run]\nphase_pause_secs = 0\n",
    )
    .unwrap();
    dir
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_autoplan_help() {
        autoplan()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--plan"))
            .stdout(predicate::str::contains("--start-phase"));
    }

    #[test]
    fn test_autoplan_version() {
        autoplan().arg("--version").assert().success();
    }

    #[test]
    fn test_mode_is_required() {
        autoplan().assert().failure();
    }

    #[test]
    fn test_modes_are_mutually_exclusive() {
        autoplan()
            .args(["--plan", "plan.md", "--interactive"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }

    #[test]
    fn test_list_requires_plan() {
        autoplan()
            .args(["--interactive", "--list"])
            .assert()
            .failure();
    }

    #[test]
    fn test_invalid_order_is_rejected() {
        autoplan()
            .args(["--plan", "plan.md", "--order", "sideways"])
            .assert()
            .failure();
    }
}

// =============================================================================
// Plan Loading Tests
// =============================================================================

mod plan_loading {
    use super::*;

    #[test]
    fn test_missing_plan_exits_with_error() {
        let dir = TempDir::new().unwrap();
        autoplan()
            .current_dir(dir.path())
            .args(["--plan", "missing.md", "--dry-run"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Plan file not found"));
    }

    #[test]
    fn test_plan_without_phases_exits_with_error() {
        let dir = create_project("# Notes\n\nNothing to do here.\n");
        autoplan()
            .current_dir(dir.path())
            .args(["--plan", "plan.md", "--dry-run"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("No phases found"));
    }

    #[test]
    fn test_malformed_config_exits_with_error() {
        let dir = create_project(THREE_PHASES);
        fs::write(dir.path().join("autoplan.toml"), "[run\n").unwrap();
        autoplan()
            .current_dir(dir.path())
            .args(["--plan", "plan.md", "--dry-run"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("autoplan.toml"));
    }

    #[test]
    fn test_list_shows_progress() {
        let dir = create_project(THREE_PHASES);
        autoplan()
            .current_dir(dir.path())
            .args(["--plan", "plan.md", "--list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 of 3 phases complete"))
            .stdout(predicate::str::contains("Setup"))
            .stdout(predicate::str::contains("0/1"));
    }
}

// =============================================================================
// Dry Run Tests
// =============================================================================

mod dry_run {
    use super::*;

    #[test]
    fn test_dry_run_respects_window() {
        let dir = create_project(THREE_PHASES);
        autoplan()
            .current_dir(dir.path())
            .args([
                "--plan",
                "plan.md",
                "--dry-run",
                "--start-phase",
                "2",
                "--end-phase",
                "2",
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("[DRY RUN] Would implement phase 2"))
            .stderr(predicate::str::contains("Would implement phase 3").not());
    }

    #[test]
    fn test_dry_run_skips_completed_phases() {
        let dir = create_project(THREE_PHASES);
        autoplan()
            .current_dir(dir.path())
            .args(["--plan", "plan.md", "--dry-run"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Phase 1 already completed"))
            .stderr(predicate::str::contains("Would implement phase 1").not())
            .stderr(predicate::str::contains("[DRY RUN] Would implement phase 3"));
    }

    #[test]
    fn test_dry_run_does_not_need_template() {
        let dir = create_project(THREE_PHASES);
        fs::remove_dir_all(dir.path().join(".claude")).unwrap();
        autoplan()
            .current_dir(dir.path())
            .args(["--plan", "plan.md", "--dry-run"])
            .assert()
            .success();
    }

    #[test]
    fn test_empty_window_completes() {
        let dir = create_project(THREE_PHASES);
        autoplan()
            .current_dir(dir.path())
            .args(["--plan", "plan.md", "--dry-run", "--start-phase", "9"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No phases selected"));
    }

    #[test]
    fn test_create_dry_run_reports_placeholder_path() {
        let dir = TempDir::new().unwrap();
        autoplan()
            .current_dir(dir.path())
            .args(["--create", "add login", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "thoughts/shared/plans/dry-run-plan.md",
            ))
            .stderr(predicate::str::contains(
                "[DRY RUN] Would create plan for: add login",
            ));
    }
}

// =============================================================================
// Agent-backed Runs
// =============================================================================

#[cfg(unix)]
mod agent_runs {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable fake agent that logs each call and prints `reply`.
    fn fake_agent(dir: &Path, reply: &str) -> String {
        let script = dir.join("fake-claude.sh");
        let log = dir.join("calls.log");
        let event = format!(
            r#"{{"type":"assistant","message":{{"content":[{{"type":"text","text":"{}"}}]}},"session_id":"s-1"}}"#,
            reply
        );
        fs::write(
            &script,
            format!(
                "#!/bin/sh\ncat > /dev/null\necho call >> '{}'\necho '{}'\n",
                log.display(),
                event
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    fn calls(dir: &Path) -> usize {
        fs::read_to_string(dir.join("calls.log"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    #[test]
    fn test_run_implements_pending_phases() {
        let dir = create_project(THREE_PHASES);
        let agent = fake_agent(dir.path(), "Phase Complete");

        autoplan()
            .current_dir(dir.path())
            .env("AUTOPLAN_CLAUDE_CMD", &agent)
            .args(["--plan", "plan.md"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Implementation complete!"));

        // phase 1 was already checked off
        assert_eq!(calls(dir.path()), 2);
    }

    #[test]
    fn test_env_agent_command_overrides_config() {
        let dir = create_project(THREE_PHASES);
        fs::write(
            dir.path().join("autoplan.toml"),
            "[agent]\ncommand = \"no-such-claude-binary\"\n\n[run]\nphase_pause_secs = 0\n",
        )
        .unwrap();
        let agent = fake_agent(dir.path(), "Phase Complete");

        autoplan()
            .current_dir(dir.path())
            .env("AUTOPLAN_CLAUDE_CMD", &agent)
            .args(["--plan", "plan.md"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Implementation complete!"));

        assert_eq!(calls(dir.path()), 2);
    }

    #[test]
    fn test_run_stops_on_first_failure() {
        let dir = create_project(THREE_PHASES);
        let agent = fake_agent(dir.path(), "I changed some files");

        autoplan()
            .current_dir(dir.path())
            .env("AUTOPLAN_CLAUDE_CMD", &agent)
            .args(["--plan", "plan.md"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stopped"))
            .stdout(predicate::str::contains("no completion signal"));

        assert_eq!(calls(dir.path()), 1);
    }

    #[test]
    fn test_manual_verification_counts_as_success() {
        let dir = create_project(THREE_PHASES);
        let agent = fake_agent(dir.path(), "Ready for Manual Verification");

        autoplan()
            .current_dir(dir.path())
            .env("AUTOPLAN_CLAUDE_CMD", &agent)
            .args(["--plan", "plan.md"])
            .assert()
            .success()
            .stdout(predicate::str::contains("awaiting manual verification"));

        assert_eq!(calls(dir.path()), 2);
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let dir = create_project(THREE_PHASES);
        fs::remove_dir_all(dir.path().join(".claude")).unwrap();
        let agent = fake_agent(dir.path(), "Phase Complete");

        autoplan()
            .current_dir(dir.path())
            .env("AUTOPLAN_CLAUDE_CMD", &agent)
            .env("HOME", dir.path())
            .args(["--plan", "plan.md"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Slash command not found"));

        assert_eq!(calls(dir.path()), 0);
    }

    #[test]
    fn test_create_with_yes_runs_new_plan() {
        let dir = create_project(THREE_PHASES);
        fs::create_dir_all(dir.path().join("thoughts/shared/plans")).unwrap();
        fs::copy(
            dir.path().join("plan.md"),
            dir.path().join("thoughts/shared/plans/new.md"),
        )
        .unwrap();
        let agent = fake_agent(
            dir.path(),
            "Phase Complete. Plan written to `thoughts/shared/plans/new.md`",
        );

        autoplan()
            .current_dir(dir.path())
            .env("AUTOPLAN_CLAUDE_CMD", &agent)
            .args(["--create", "polish things", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Plan created at: thoughts/shared/plans/new.md",
            ))
            .stdout(predicate::str::contains("Implementation complete!"));

        // one create call, then phases 2 and 3
        assert_eq!(calls(dir.path()), 3);
    }
}
