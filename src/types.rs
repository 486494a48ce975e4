//! Shared types for the recap pipeline.
//!
//! Everything here is request-scoped: built at the start of one recap run
//! from the provider documents and dropped when the run returns.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// League document
// ---------------------------------------------------------------------------

/// A normalized league scoreboard for one week.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueDocument {
    pub id: String,
    pub name: String,
    pub week: u32,
    pub matchups: Vec<MatchupRecord>,
}

impl LeagueDocument {
    /// All teams in scan order (matchup order, then A before B).
    pub fn teams(&self) -> impl Iterator<Item = &TeamRecord> {
        self.matchups
            .iter()
            .flat_map(|m| [&m.team_a, &m.team_b])
    }

    /// Highest and lowest scoring teams across the whole league.
    ///
    /// Teams are stably sorted by total descending; the highest is the first
    /// entry and the lowest the last, so ties at the top go to the team seen
    /// first and ties at the bottom to the team seen last.
    pub fn highs_and_lows(&self) -> Option<(TeamScore, TeamScore)> {
        let mut scores: Vec<TeamScore> = self
            .teams()
            .map(|t| TeamScore {
                name: t.name.clone(),
                points: t.total_points,
            })
            .collect();
        scores.sort_by(|a, b| b.points.total_cmp(&a.points));
        let highest = scores.first()?.clone();
        let lowest = scores.last()?.clone();
        Some((highest, lowest))
    }
}

/// One head-to-head matchup. Always exactly two teams.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupRecord {
    pub team_a: TeamRecord,
    pub team_b: TeamRecord,
    /// Provider-declared winner. Absent on ties and in-progress weeks.
    pub winner_key: Option<String>,
}

impl MatchupRecord {
    /// The winning side as labeled by the provider.
    ///
    /// Falls back to the higher score (team A on an exact tie) when the
    /// winner key is absent or names neither team.
    pub fn winner(&self) -> Side {
        match self.winner_key.as_deref() {
            Some(key) if key == self.team_a.team_key => Side::A,
            Some(key) if key == self.team_b.team_key => Side::B,
            _ => self.higher_scorer(),
        }
    }

    /// The side with the higher total, team A on an exact tie.
    pub fn higher_scorer(&self) -> Side {
        if self.team_b.total_points > self.team_a.total_points {
            Side::B
        } else {
            Side::A
        }
    }

    /// How far the winner label can be trusted.
    pub fn winner_check(&self) -> WinnerCheck {
        let a = self.team_a.total_points;
        let b = self.team_b.total_points;
        let labeled = match self.winner_key.as_deref() {
            Some(key) if key == self.team_a.team_key => Side::A,
            Some(key) if key == self.team_b.team_key => Side::B,
            Some(_) => return WinnerCheck::KeyUnknown,
            None if a == b => return WinnerCheck::TieUnlabeled,
            None => return WinnerCheck::Agrees,
        };
        // A declared winner on an exact tie cannot be confirmed by score.
        let agrees = match labeled {
            Side::A => a > b,
            Side::B => b > a,
        };
        if agrees {
            WinnerCheck::Agrees
        } else {
            WinnerCheck::Disagrees
        }
    }

    pub fn team(&self, side: Side) -> &TeamRecord {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }
}

/// Result of checking a matchup's winner label against its scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerCheck {
    /// The label is the strictly higher scorer.
    Agrees,
    /// The winner key names neither team; the label came from the scores.
    KeyUnknown,
    /// Equal scores and no winner key; team A was labeled.
    TieUnlabeled,
    /// The declared winner did not outscore the other team.
    Disagrees,
}

impl WinnerCheck {
    pub fn is_agreed(&self) -> bool {
        matches!(self, WinnerCheck::Agrees)
    }
}

impl fmt::Display for WinnerCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinnerCheck::Agrees => write!(f, "agrees"),
            WinnerCheck::KeyUnknown => write!(f, "winner key names neither team"),
            WinnerCheck::TieUnlabeled => write!(f, "tie without a winner key"),
            WinnerCheck::Disagrees => write!(f, "declared winner did not score higher"),
        }
    }
}

/// Which of the two teams in a matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRecord {
    pub name: String,
    pub team_key: String,
    pub total_points: f64,
    pub roster: Vec<PlayerRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub key: String,
    pub display_name: String,
    /// `None` when the extractor found no usable scoring data.
    /// Never conflated with zero points.
    pub points: Option<f64>,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// A roster player among a team's highest scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub name: String,
    pub points: f64,
}

impl fmt::Display for TopPerformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} pts)", self.name, fmt_points(self.points))
    }
}

/// A team's name and weekly total, used for the highs/lows footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub name: String,
    pub points: f64,
}

/// The minimal per-matchup projection handed to text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactMatchupView {
    pub team_a_name: String,
    pub team_b_name: String,
    pub winner: Side,
    pub score_a: f64,
    pub score_b: f64,
    pub top_a: Vec<TopPerformer>,
    pub top_b: Vec<TopPerformer>,
}

impl CompactMatchupView {
    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::A => &self.team_a_name,
            Side::B => &self.team_b_name,
        }
    }

    pub fn score(&self, side: Side) -> f64 {
        match side {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }

    pub fn top(&self, side: Side) -> &[TopPerformer] {
        match side {
            Side::A => &self.top_a,
            Side::B => &self.top_b,
        }
    }

    pub fn winner_name(&self) -> &str {
        self.name(self.winner)
    }

    pub fn loser_name(&self) -> &str {
        self.name(self.winner.opposite())
    }

    /// Scores ordered higher first, regardless of the winner label.
    pub fn scores_high_low(&self) -> (f64, f64) {
        if self.score_a >= self.score_b {
            (self.score_a, self.score_b)
        } else {
            (self.score_b, self.score_a)
        }
    }

    pub fn margin(&self) -> f64 {
        (self.score_a - self.score_b).abs()
    }
}

/// Recap text for one matchup: model output or the fallback template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFragment {
    pub matchup_index: usize,
    pub text: String,
    pub source: FragmentSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentSource {
    Model,
    Fallback,
}

/// Format a point value with exactly two decimals.
pub fn fmt_points(points: f64) -> String {
    format!("{points:.2}")
}

// ---------------------------------------------------------------------------
// Pipeline surface
// ---------------------------------------------------------------------------

/// Input to one recap run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecapRequest {
    /// Raw scoreboard XML (matchups, teams, rosters).
    pub scoreboard: String,
    /// Raw player-stats XML documents, one per key batch.
    pub player_stats: Vec<String>,
    pub mood: String,
}

/// Result of one recap run. Never carries a partially written body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecapStatus {
    Success { markup: String },
    Failure { reason: String, client_error: bool },
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the recap pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecapError {
    #[error("Missing required field: {path}")]
    Structural { path: String },

    #[error("Invalid value at {path}: {value:?}")]
    InvalidValue { path: String, value: String },

    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("League scoreboard has no matchups")]
    NoMatchups,

    #[error("Text generation credential is not configured")]
    MissingCredential,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Upstream error ({provider}): {message}")]
    Upstream { provider: String, message: String },
}

impl RecapError {
    pub fn structural(path: impl Into<String>) -> Self {
        RecapError::Structural { path: path.into() }
    }

    /// Errors caused by the caller's input (surfaced as 400-class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecapError::Structural { .. }
                | RecapError::InvalidValue { .. }
                | RecapError::Xml(_)
                | RecapError::NoMatchups
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
