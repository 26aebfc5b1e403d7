//! Progress reporting for deliberation runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use roundtable_application::DeliberationProgress;
use roundtable_domain::{Participant, SessionId};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress during a deliberation with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
    synthesis_spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
            synthesis_spinner: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliberationProgress for ProgressReporter {
    fn on_session_start(&self, session_id: &SessionId, participants: &[Participant], max_rounds: u32) {
        let names: Vec<&str> = participants.iter().map(|p| p.name.as_str()).collect();
        let _ = self.multi.println(format!(
            "{} {} with {} for {} round(s)",
            "->".cyan(),
            session_id.as_str().bold(),
            names.join(", "),
            max_rounds
        ));
    }

    fn on_round_start(&self, round: u32, max_rounds: u32, pending: usize) {
        let pb = self.multi.add(ProgressBar::new(pending as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(format!("Round {}/{}", round, max_rounds));
        pb.set_message("Starting...");
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.round_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_turn_complete(&self, _round: u32, agent: &Participant, success: bool) {
        if let Ok(slot) = self.round_bar.lock()
            && let Some(pb) = slot.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), agent.name)
            } else {
                format!("{} {} (skipped)", "x".red(), agent.name)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, round: u32, turns_recorded: usize) {
        if let Ok(mut slot) = self.round_bar.lock()
            && let Some(pb) = slot.take()
        {
            let summary = format!("Round {} complete: {} turn(s)", round, turns_recorded);
            if turns_recorded == 0 {
                pb.finish_with_message(summary.yellow().to_string());
            } else {
                pb.finish_with_message(summary.green().to_string());
            }
        }
    }

    fn on_synthesis_start(&self) {
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(Self::spinner_style());
        spinner.set_prefix("Synthesis");
        spinner.set_message("Extracting action items...");
        spinner.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.synthesis_spinner.lock() {
            *slot = Some(spinner);
        }
    }

    fn on_synthesis_complete(&self, action_items: &[String]) {
        if let Ok(mut slot) = self.synthesis_spinner.lock()
            && let Some(spinner) = slot.take()
        {
            spinner.finish_with_message(format!("{} action item(s)", action_items.len()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl DeliberationProgress for SimpleProgress {
    fn on_session_start(&self, session_id: &SessionId, participants: &[Participant], max_rounds: u32) {
        println!(
            "{} {} ({} agents, {} rounds)",
            "->".cyan(),
            session_id.as_str().bold(),
            participants.len(),
            max_rounds
        );
    }

    fn on_round_start(&self, round: u32, max_rounds: u32, pending: usize) {
        println!(
            "{} {} ({} agents)",
            "->".cyan(),
            format!("Round {}/{}", round, max_rounds).bold(),
            pending
        );
    }

    fn on_turn_complete(&self, _round: u32, agent: &Participant, success: bool) {
        if success {
            println!("  {} {}", "v".green(), agent.name);
        } else {
            println!("  {} {} (skipped)", "x".red(), agent.name);
        }
    }

    fn on_round_complete(&self, _round: u32, _turns_recorded: usize) {
        println!();
    }

    fn on_synthesis_start(&self) {
        println!("{} {}", "->".cyan(), "Synthesis".bold());
    }
}
