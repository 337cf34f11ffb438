use crate::ui::icons::{CHECK, CLOCK, CROSS, EYES, SKIP, SPARKLE};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Terminal UI for a plan run, rendered via `indicatif` progress bars.
///
/// Two bars are stacked vertically:
/// - Phase bar: how many selected phases have finished
/// - Agent bar: spinner with the latest tool use or text snippet
///
/// When stderr is not a terminal `indicatif` hides the bars and lines go
/// straight to stderr.
pub struct RunUi {
    multi: MultiProgress,
    phase_bar: ProgressBar,
    agent_bar: ProgressBar,
    verbose: bool,
    current_phase: AtomicU32,
}

impl RunUi {
    /// Create the UI for a run of `total_phases` phases.
    ///
    /// With `verbose` set, agent text is echoed in full; otherwise only
    /// tool-use lines are printed.
    pub fn new(total_phases: u64, verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let phase_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let phase_bar = multi.add(ProgressBar::new(total_phases));
        phase_bar.set_style(phase_style);
        phase_bar.set_prefix("Phases");

        let agent_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");

        let agent_bar = multi.add(ProgressBar::new_spinner());
        agent_bar.set_style(agent_style);
        agent_bar.set_prefix(" Agent");

        Self {
            multi,
            phase_bar,
            agent_bar,
            verbose,
            current_phase: AtomicU32::new(0),
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Print the header block and start the agent spinner.
    pub fn start_phase(&self, number: u32, name: &str) {
        self.current_phase.store(number, Ordering::SeqCst);
        self.phase_bar
            .set_message(format!("{}: {}", style(number).yellow(), name));
        self.print_phase_header(number, name);
        // the previous phase finished and hid the spinner
        self.agent_bar.reset();
        self.agent_bar.set_message(format!(
            "Phase {} {}",
            style(number).cyan(),
            style("(starting agent...)").dim()
        ));
        self.agent_bar.enable_steady_tick(Duration::from_millis(100));
    }

    /// Show a tool use event (Read, Write, Edit, Bash, etc.)
    pub fn show_tool_use(&self, emoji: &str, description: &str) {
        let number = self.current_phase.load(Ordering::SeqCst);
        self.agent_bar.set_message(format!(
            "Phase {} {} {}",
            style(number).cyan(),
            emoji,
            style(description).yellow()
        ));
        self.print_line(format!("    {} {}", emoji, style(description).yellow()));
    }

    /// Show a snippet of the agent's text; the full text is printed in verbose mode.
    pub fn show_text(&self, snippet: &str, full: &str) {
        let number = self.current_phase.load(Ordering::SeqCst);
        self.agent_bar.set_message(format!(
            "Phase {} {}",
            style(number).cyan(),
            style(format!("💭 {}", snippet)).dim()
        ));
        if self.verbose {
            self.print_line(full);
        }
    }

    pub fn manual_verification(&self, number: u32) {
        self.print_line(format!(
            "    {}Phase {} is ready for manual verification {}",
            EYES,
            style(number).yellow().bold(),
            style("(auto-confirmed)").dim()
        ));
    }

    pub fn phase_skipped(&self, number: u32) {
        self.phase_bar.inc(1);
        self.print_line(format!(
            "{}Phase {} already completed, skipping",
            SKIP,
            style(number).dim()
        ));
    }

    pub fn phase_dry_run(&self, number: u32) {
        self.agent_bar.finish_and_clear();
        self.phase_bar.inc(1);
        self.print_line(format!(
            "{}Phase {} {}",
            CHECK,
            style(number).cyan(),
            style("(dry run)").dim()
        ));
    }

    /// Increment the phase progress bar and print a celebration line.
    pub fn phase_complete(&self, number: u32, elapsed: Duration) {
        self.agent_bar.finish_and_clear();
        self.phase_bar.inc(1);
        self.print_line(format!(
            "\n{}Phase {} complete! {}{}\n",
            SPARKLE,
            style(number).green().bold(),
            CLOCK,
            style(format_elapsed(elapsed)).dim()
        ));
    }

    /// Print a phase-failure banner without advancing the phase progress bar.
    pub fn phase_failed(&self, number: u32, reason: &str) {
        self.agent_bar.finish_and_clear();
        self.print_line(format!(
            "\n{}Phase {} failed: {}\n",
            CROSS,
            style(number).red().bold(),
            reason
        ));
    }

    /// Note the pause before a fresh agent session starts.
    pub fn between_phases(&self, pause: Duration) {
        if self.verbose {
            self.print_line(format!(
                "    {} {}",
                style("→").dim(),
                style(format!(
                    "starting a fresh session in {}",
                    format_elapsed(pause)
                ))
                .dim()
            ));
        }
    }

    /// Stop the bars at the end of a run.
    pub fn finish(&self) {
        self.agent_bar.finish_and_clear();
        self.phase_bar.finish();
    }

    /// Print a full-width cyan separator line (70 `═` characters).
    pub fn print_separator(&self) {
        self.print_line(format!("{}", style("═".repeat(70)).cyan()));
    }

    pub fn print_phase_header(&self, number: u32, name: &str) {
        self.print_line("");
        self.print_separator();
        self.print_line(format!(
            "{} Phase {}: {}",
            style("▶").green().bold(),
            style(number).yellow().bold(),
            name
        ));
        self.print_separator();
        self.print_line("");
    }
}

/// Formats as `Xs` or `Xm Ys` when >= 60 seconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
