//! Console output formatter for deliberation sessions

use colored::Colorize;
use roundtable_application::DeliberationOutcome;
use roundtable_domain::{SessionProjection, SessionStatus};
use serde::Serialize;

/// Formats session projections and run outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the full session: transcript grouped by round, then action items
    pub fn format_projection(projection: &SessionProjection) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Roundtable Session"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Topic:".cyan().bold(),
            projection.topic
        ));
        output.push_str(&format!(
            "{} {}  {} {}/{}\n",
            "Status:".cyan().bold(),
            Self::status_label(projection.status),
            "Round:".cyan().bold(),
            projection.current_round,
            projection.max_rounds
        ));
        output.push_str(&format!(
            "{} {}/{}{}\n",
            "Turns:".cyan().bold(),
            projection.transcript.len(),
            projection.expected_turns,
            if projection.status == SessionStatus::Completed && projection.is_partial() {
                format!(" {}", "(partial)".yellow())
            } else {
                String::new()
            }
        ));

        let mut round = 0;
        for turn in &projection.transcript {
            if turn.round != round {
                round = turn.round;
                output.push_str(&Self::section_header(&format!("Round {}", round)));
            }
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", turn.agent_name).yellow().bold(),
                Self::indent(&turn.content, "  ")
            ));
        }

        if !projection.action_items.is_empty() {
            output.push_str(&Self::section_header("Action Items"));
            for (i, item) in projection.action_items.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, item));
            }
        }

        if let Some(completed_at) = projection.completed_at {
            output.push_str(&format!(
                "\n{} {}\n",
                "Completed:".dimmed(),
                completed_at.to_rfc3339()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    /// One-paragraph summary of a finished run
    pub fn format_outcome(outcome: &DeliberationOutcome) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} is {}\n",
            "Session".bold(),
            outcome.session_id.as_str().bold(),
            Self::status_label(outcome.status)
        ));
        output.push_str(&format!(
            "  {} turn(s) of {} expected, last round {}\n",
            outcome.turns_recorded, outcome.expected_turns, outcome.last_round
        ));
        if outcome.stopped_early {
            output.push_str(&format!(
                "  {}\n",
                "Stopped early: no agent produced a turn".yellow()
            ));
        } else if outcome.is_partial() && outcome.status == SessionStatus::Completed {
            output.push_str(&format!("  {}\n", "Some turns were skipped".yellow()));
        }

        if !outcome.action_items.is_empty() {
            output.push_str(&format!("\n{}\n", "Action Items:".green().bold()));
            for item in &outcome.action_items {
                output.push_str(&format!("  * {}\n", item));
            }
        }

        output
    }

    /// Format any serializable result as JSON
    pub fn format_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn status_label(status: SessionStatus) -> String {
        match status {
            SessionStatus::Draft => status.as_str().dimmed().to_string(),
            SessionStatus::Running => status.as_str().cyan().to_string(),
            SessionStatus::Completed => status.as_str().green().to_string(),
            SessionStatus::Cancelled => status.as_str().red().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
