//! Document normalizer.
//!
//! Turns the loose singular-or-list provider tree into strict, ordered
//! league/matchup/team/player records. Every required path is looked up
//! through [`require`], so a missing level is reported with the full dotted
//! path (indexes included) instead of surfacing later as a bad lookup.

use serde_json::Value;
use tracing::debug;

use super::points;
use super::xml::TEXT_KEY;
use crate::types::{LeagueDocument, MatchupRecord, PlayerRecord, RecapError, TeamRecord};

const DEFAULT_LEAGUE_NAME: &str = "Unknown League";

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

/// View a possibly-repeating node as an ordered sequence.
///
/// A missing node or an empty element (`""`) is an empty sequence, a list
/// is itself, anything else is a one-element sequence.
pub fn as_sequence(node: Option<&Value>) -> Vec<&Value> {
    match node {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

/// Walk `keys` from `node`, failing with the dotted path of the first
/// missing level.
pub fn require<'a>(node: &'a Value, base: &str, keys: &[&str]) -> Result<&'a Value, RecapError> {
    let mut current = node;
    let mut path = base.to_string();
    for key in keys {
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(key);
        current = current
            .get(*key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| RecapError::structural(path.clone()))?;
    }
    Ok(current)
}

/// Walk `keys` from `node`, returning `None` at the first missing level.
pub fn lookup<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .try_fold(node, |current, key| current.get(*key))
        .filter(|v| !v.is_null())
}

/// The text content of a scalar node: a string, a number, or an element
/// with attributes whose text sits under `"_"`.
pub fn scalar_text(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get(TEXT_KEY).and_then(scalar_text),
        _ => None,
    }
}

/// Parse a scalar node as a finite float. NaN and infinities are rejected.
pub fn scalar_f64(node: &Value) -> Option<f64> {
    let text = scalar_text(node)?;
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn join(base: &str, key: &str) -> String {
    format!("{base}.{key}")
}

// ---------------------------------------------------------------------------
// League parsing
// ---------------------------------------------------------------------------

/// Normalize a decoded scoreboard tree into a [`LeagueDocument`].
pub fn parse_league(tree: &Value) -> Result<LeagueDocument, RecapError> {
    let league_path = "fantasy_content.league";
    let league = require(tree, "", &["fantasy_content", "league"])?;

    let id = lookup(league, &["league_id"])
        .and_then(scalar_text)
        .unwrap_or_default();
    let name = lookup(league, &["name"])
        .and_then(scalar_text)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_LEAGUE_NAME.to_string());

    let scoreboard_path = join(league_path, "scoreboard");
    let scoreboard = require(league, league_path, &["scoreboard"])?;

    let week_node = require(scoreboard, &scoreboard_path, &["week"])?;
    let week = scalar_text(week_node)
        .and_then(|w| w.parse::<u32>().ok())
        .ok_or_else(|| RecapError::InvalidValue {
            path: join(&scoreboard_path, "week"),
            value: scalar_text(week_node).unwrap_or_default(),
        })?;

    let matchups_path = join(&scoreboard_path, "matchups");
    let matchups_node = require(scoreboard, &scoreboard_path, &["matchups"])?;
    let raw_matchups = as_sequence(matchups_node.get("matchup"));
    if raw_matchups.is_empty() {
        return Err(RecapError::NoMatchups);
    }

    let matchups = raw_matchups
        .into_iter()
        .enumerate()
        .map(|(i, m)| parse_matchup(m, &format!("{matchups_path}.matchup[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        league_id = %id,
        week,
        matchups = matchups.len(),
        "League document normalized"
    );

    Ok(LeagueDocument {
        id,
        name,
        week,
        matchups,
    })
}

fn parse_matchup(node: &Value, path: &str) -> Result<MatchupRecord, RecapError> {
    let teams_node = require(node, path, &["teams", "team"])?;
    let teams_path = join(path, "teams.team");
    let teams = as_sequence(Some(teams_node));
    if teams.len() != 2 {
        return Err(RecapError::InvalidValue {
            path: teams_path,
            value: format!("expected 2 teams, found {}", teams.len()),
        });
    }

    let team_a = parse_team(teams[0], &format!("{teams_path}[0]"))?;
    let team_b = parse_team(teams[1], &format!("{teams_path}[1]"))?;

    let winner_key = lookup(node, &["winner_team_key"])
        .and_then(scalar_text)
        .filter(|k| !k.is_empty());

    Ok(MatchupRecord {
        team_a,
        team_b,
        winner_key,
    })
}

fn parse_team(node: &Value, path: &str) -> Result<TeamRecord, RecapError> {
    let name = require(node, path, &["name"]).map(|n| scalar_text(n).unwrap_or_default())?;
    let team_key = require(node, path, &["team_key"]).map(|n| scalar_text(n).unwrap_or_default())?;

    let total_node = require(node, path, &["team_points", "total"])?;
    let total_points = scalar_f64(total_node).ok_or_else(|| RecapError::InvalidValue {
        path: join(path, "team_points.total"),
        value: scalar_text(total_node).unwrap_or_default(),
    })?;

    let roster = as_sequence(lookup(node, &["roster", "players", "player"]))
        .into_iter()
        .map(parse_player)
        .collect();

    Ok(TeamRecord {
        name,
        team_key,
        total_points,
        roster,
    })
}

/// Normalize one player node. Shared by the roster and the player-stats
/// documents, which use the same player element layout.
pub fn parse_player(node: &Value) -> PlayerRecord {
    let key = lookup(node, &["player_key"])
        .and_then(scalar_text)
        .unwrap_or_default();

    let display_name = lookup(node, &["name", "full"])
        .and_then(scalar_text)
        .or_else(|| lookup(node, &["name"]).and_then(scalar_text))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| key.clone());

    PlayerRecord {
        key,
        display_name,
        points: points::extract(node),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
