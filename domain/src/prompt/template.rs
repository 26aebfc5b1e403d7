//! Prompt templates for the deliberation flow

use crate::session::entities::Turn;

/// Everything the turn prompt embeds besides the agent's own system prompt.
#[derive(Debug, Clone, Copy)]
pub struct TurnPromptContext<'a> {
    pub topic: &'a str,
    pub objective: Option<&'a str>,
    pub round: u32,
    pub max_rounds: u32,
    /// Already truncated to the context window
    pub prior_turns: &'a [Turn],
}

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Format turns as `"<agentName>: <content>"` blocks separated by blank lines.
    pub fn format_turns(turns: &[Turn]) -> String {
        turns
            .iter()
            .map(|t| format!("{}: {}", t.agent_name, t.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Single user message for one agent's turn
    pub fn turn_prompt(ctx: &TurnPromptContext<'_>) -> String {
        let mut prompt = format!("Topic: {}\n", ctx.topic);

        if let Some(objective) = ctx.objective.filter(|o| !o.trim().is_empty()) {
            prompt.push_str(&format!("Objective: {}\n", objective));
        }

        prompt.push_str(&format!(
            "\nThis is round {} of {}.\n",
            ctx.round, ctx.max_rounds
        ));

        if ctx.prior_turns.is_empty() {
            prompt.push_str(
                r#"
You are opening the discussion. Share your initial perspective on the topic."#,
            );
        } else {
            prompt.push_str(&format!(
                r#"
Previous discussion:

{}

Respond to the points raised so far. Build on them, challenge them where you disagree, and add what is missing."#,
                Self::format_turns(ctx.prior_turns)
            ));
        }

        prompt
    }

    /// System prompt for the synthesis step
    pub fn synthesis_system() -> &'static str {
        r#"You are a facilitator closing a multi-participant deliberation.
Your task is to turn the discussion into concrete, actionable next steps.
Each action item must be a single self-contained sentence.
Respond with a JSON array of strings and nothing else."#
    }

    /// User prompt for the synthesis step
    pub fn synthesis_prompt(topic: &str, transcript: &[Turn]) -> String {
        format!(
            r#"Topic: {}

Full discussion:

{}

Extract between 3 and 5 action items from the discussion above.
Return them as a JSON array of strings, for example:
["First action item", "Second action item", "Third action item"]"#,
            topic,
            Self::format_turns(transcript)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns() -> Vec<Turn> {
        vec![
            Turn::new("a", "Alice", "We should ship weekly.", 1),
            Turn::new("b", "Bob", "Weekly is too fast for QA.", 1),
        ]
    }

    #[test]
    fn test_format_turns() {
        assert_eq!(
            PromptTemplate::format_turns(&turns()),
            "Alice: We should ship weekly.\n\nBob: Weekly is too fast for QA."
        );
        assert_eq!(PromptTemplate::format_turns(&[]), "");
    }

    #[test]
    fn test_turn_prompt_embeds_context() {
        let prior = turns();
        let prompt = PromptTemplate::turn_prompt(&TurnPromptContext {
            topic: "Release cadence",
            objective: Some("Pick a cadence"),
            round: 2,
            max_rounds: 3,
            prior_turns: &prior,
        });

        assert!(prompt.contains("Topic: Release cadence"));
        assert!(prompt.contains("Objective: Pick a cadence"));
        assert!(prompt.contains("round 2 of 3"));
        assert!(prompt.contains("Bob: Weekly is too fast for QA."));
        assert!(!prompt.contains("opening the discussion"));
    }

    #[test]
    fn test_turn_prompt_first_turn() {
        let prompt = PromptTemplate::turn_prompt(&TurnPromptContext {
            topic: "Release cadence",
            objective: None,
            round: 1,
            max_rounds: 3,
            prior_turns: &[],
        });

        assert!(prompt.contains("opening the discussion"));
        assert!(!prompt.contains("Objective:"));
        assert!(!prompt.contains("Previous discussion"));
    }

    #[test]
    fn test_synthesis_prompt() {
        let prompt = PromptTemplate::synthesis_prompt("Release cadence", &turns());
        assert!(prompt.contains("Topic: Release cadence"));
        assert!(prompt.contains("Alice: We should ship weekly."));
        assert!(prompt.contains("JSON array"));
    }
}
