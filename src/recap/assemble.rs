//! Final markup assembly.
//!
//! Pure and deterministic: identical views, fragments and footer teams give
//! byte-identical output. Names and generated text are HTML-escaped.

use html_escape::encode_text;

use crate::types::{fmt_points, CompactMatchupView, GeneratedFragment, TeamScore};

/// Render the weekly recap document.
///
/// `fragments` must be aligned with `views` by matchup index; a missing
/// fragment renders an empty summary line rather than shifting later ones.
pub fn assemble(
    league_name: &str,
    week: u32,
    views: &[CompactMatchupView],
    fragments: &[GeneratedFragment],
    highest: &TeamScore,
    lowest: &TeamScore,
) -> String {
    let mut out = format!("<h1>🏈 {} - Week {week} 🏈</h1>\n", encode_text(league_name));

    for (index, view) in views.iter().enumerate() {
        let text = fragments
            .iter()
            .find(|f| f.matchup_index == index)
            .map(|f| f.text.as_str())
            .unwrap_or("");
        let winner = encode_text(view.winner_name());
        let loser = encode_text(view.loser_name());
        let (high, low) = view.scores_high_low();

        out.push_str(&format!("<h3>Matchup {}: {winner} 🆚 {loser}</h3>\n", index + 1));
        out.push_str(&format!("<p>🏆 Winner: {winner}<br>\n"));
        out.push_str(&format!("📊 Score: {} - {}<br>\n", fmt_points(high), fmt_points(low)));
        out.push_str(&format!("Summary: {}</p>\n", encode_text(text)));
    }

    out.push_str("<h2>Highs &amp; Lows</h2>\n");
    out.push_str(&format!(
        "<p>🏆 Highest: {} with {} points<br>\n",
        encode_text(&highest.name),
        fmt_points(highest.points)
    ));
    out.push_str(&format!(
        "😞 Lowest: {} with {} points</p>\n",
        encode_text(&lowest.name),
        fmt_points(lowest.points)
    ));

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
