//! Deterministic fallback recap text.
//!
//! Used when generation fails, times out or returns nothing. Built only from
//! the matchup's compact view, the mood and the matchup index, so the same
//! inputs always give the same text and it cannot fail.

use crate::types::{fmt_points, CompactMatchupView};

const EMOJIS: &[&str] = &["🏈", "🔥", "💥", "⚡", "🎯", "🚀"];

/// Verbs and closers for one mood family.
struct Vocabulary {
    keywords: &'static [&'static str],
    verbs: &'static [&'static str],
    closers: &'static [&'static str],
}

const VOCABULARIES: &[Vocabulary] = &[
    Vocabulary {
        keywords: &["pirate", "sea", "nautical"],
        verbs: &["plundered", "sank", "boarded and looted", "sent to the brig"],
        closers: &[
            "The crew will be counting doubloons all week.",
            "Somebody check the rigging before next Sunday.",
        ],
    },
    Vocabulary {
        keywords: &["noir", "detective", "mystery"],
        verbs: &["put the squeeze on", "outfoxed", "closed the case on", "left in the rain"],
        closers: &[
            "The city never sleeps, and neither will this loser.",
            "Another week, another file for the cold-case drawer.",
        ],
    },
    Vocabulary {
        keywords: &["hype", "excited", "energetic", "party"],
        verbs: &["flattened", "blew past", "steamrolled", "overpowered"],
        closers: &[
            "Turn the volume all the way up for this one.",
            "That is how you make a Sunday loud.",
        ],
    },
    Vocabulary {
        keywords: &["sad", "gloomy", "melancholy", "emo"],
        verbs: &["quietly outlasted", "edged past", "got the better of", "slipped by"],
        closers: &[
            "Somewhere, a box score weeps softly.",
            "Even the win felt a little grey.",
        ],
    },
    Vocabulary {
        keywords: &["snark", "sarcastic", "roast", "savage"],
        verbs: &["embarrassed", "schooled", "humbled", "dunked on"],
        closers: &[
            "The waiver wire is open, for the record.",
            "Maybe set a lineup next time.",
        ],
    },
];

static NEUTRAL: Vocabulary = Vocabulary {
    keywords: &[],
    verbs: &["beat", "topped", "got past", "outscored"],
    closers: &[
        "On to next week.",
        "The standings will remember this one.",
    ],
};

/// Keywords match whole words of the mood, so "sea" does not pick up "season".
fn vocabulary_for(mood: &str) -> &'static Vocabulary {
    let mood = mood.to_lowercase();
    let words: Vec<&str> = mood
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    VOCABULARIES
        .iter()
        .find(|v| v.keywords.iter().any(|k| words.contains(k)))
        .unwrap_or(&NEUTRAL)
}

/// Build the fallback recap for the matchup at `index`.
pub fn fallback_text(view: &CompactMatchupView, index: usize, mood: &str) -> String {
    let vocab = vocabulary_for(mood);
    let emoji = EMOJIS[index % EMOJIS.len()];
    let verb = vocab.verbs[index % vocab.verbs.len()];
    let closer = vocab.closers[index % vocab.closers.len()];

    let winner = view.winner_name();
    let loser = view.loser_name();
    let winner_score = view.score(view.winner);
    let loser_score = view.score(view.winner.opposite());

    let mut text = format!(
        "{emoji} {winner} {verb} {loser} {} to {}, a margin of {} points.",
        fmt_points(winner_score),
        fmt_points(loser_score),
        fmt_points(view.margin()),
    );

    match view.top(view.winner).first() {
        Some(star) => text.push_str(&format!(
            " {} led {winner} with {} points.",
            star.name,
            fmt_points(star.points)
        )),
        None => text.push_str(&format!(" {winner} got there as a team effort.")),
    }

    if let Some(best_loser) = view.top(view.winner.opposite()).first() {
        text.push_str(&format!(
            " {} put up {} for {loser} in a losing effort.",
            best_loser.name,
            fmt_points(best_loser.points)
        ));
    }

    text.push(' ');
    text.push_str(closer);
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
