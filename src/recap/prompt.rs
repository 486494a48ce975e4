//! Per-matchup prompt construction.
//!
//! One prompt per matchup keeps each generation call small and lets a bad
//! matchup fail on its own. Variety across a run comes from rotating style
//! hints by matchup index, never from randomness.

use crate::types::{fmt_points, CompactMatchupView, Side, TopPerformer};

/// Mood used when the caller gives none.
pub const DEFAULT_MOOD: &str = "neutral";

/// Built-in style hints, rotated by `index % len`.
pub const DEFAULT_STYLE_HINTS: &[&str] = &[
    "Open with the single performance that decided the matchup.",
    "Lead with the final margin, then explain how it got there.",
    "Tell it from the losing side's point of view before crediting the winner.",
    "Write it like a short radio call of the final whistle.",
];

/// Phrases the model is told to avoid.
pub const BANNED_PHRASES: &[&str] = &[
    "nail-biter",
    "when the dust settled",
    "at the end of the day",
    "showed up and showed out",
    "a tale of two halves",
    "left it all on the field",
    "statement win",
    "edge-of-your-seat",
];

/// Builds generation prompts with a rotating set of style hints.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    style_hints: Vec<String>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PromptBuilder {
    /// An empty hint list falls back to [`DEFAULT_STYLE_HINTS`].
    pub fn new(style_hints: Vec<String>) -> Self {
        let style_hints = if style_hints.is_empty() {
            DEFAULT_STYLE_HINTS.iter().map(|s| s.to_string()).collect()
        } else {
            style_hints
        };
        Self { style_hints }
    }

    /// The style hint for a matchup: `style_hints[index % len]`.
    pub fn style_hint_for(&self, index: usize) -> &str {
        &self.style_hints[index % self.style_hints.len()]
    }

    /// Build the prompt for the matchup at `index`.
    pub fn build(&self, view: &CompactMatchupView, index: usize, week: u32, mood: &str) -> String {
        build_prompt(view, week, mood, self.style_hint_for(index))
    }
}

/// Format a team's top performers as `name (points pts)`, or `n/a`.
pub fn format_performers(performers: &[TopPerformer]) -> String {
    if performers.is_empty() {
        return "n/a".to_string();
    }
    performers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a bounded prompt for one matchup.
pub fn build_prompt(view: &CompactMatchupView, week: u32, mood: &str, style_hint: &str) -> String {
    let mood = if mood.trim().is_empty() {
        DEFAULT_MOOD
    } else {
        mood.trim()
    };
    let banned = BANNED_PHRASES
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Theme/mood: {mood}\n\
         Week: {week}\n\
         Matchup: {team_a} vs {team_b}\n\
         Winner: {winner}\n\
         Score: {team_a} {score_a} - {team_b} {score_b}\n\
         Top performers for {team_a}: {top_a}\n\
         Top performers for {team_b}: {top_b}\n\
         \n\
         Write a recap of this fantasy football matchup in 3-4 sentences with a {mood} flavor, \
         letting the mood shape word choice without naming it outright. \
         Mention 1-2 of the named performers with their exact point values as given above. \
         Style: {style_hint} \
         Do not use these phrases: {banned}. \
         Output plain prose only: no markdown, no code fences, no headings, no lists.",
        team_a = view.name(Side::A),
        team_b = view.name(Side::B),
        winner = view.winner_name(),
        score_a = fmt_points(view.score_a),
        score_b = fmt_points(view.score_b),
        top_a = format_performers(&view.top_a),
        top_b = format_performers(&view.top_b),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
