//! Top-performer aggregation.
//!
//! Primary source is the roster embedded in the scoreboard. When not a
//! single player anywhere in the league has points there, membership is
//! rebuilt from the roster keys and points are read from the player-stats
//! documents instead (fetched in key batches, merged by concatenation).

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::document::normalize::{as_sequence, lookup, parse_player};
use crate::document::xml;
use crate::types::{LeagueDocument, TopPerformer};

/// Default number of performers kept per team.
pub const DEFAULT_TOP_N: usize = 2;

/// Where the performer points came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsSource {
    Roster,
    PlayerStats,
}

/// Per-team top performers, keyed by team key.
#[derive(Debug, Clone)]
pub struct TeamPerformers {
    by_team: HashMap<String, Vec<TopPerformer>>,
    pub source: PointsSource,
}

impl TeamPerformers {
    /// Top performers for a team; empty when none had usable points.
    pub fn for_team(&self, team_key: &str) -> &[TopPerformer] {
        self.by_team
            .get(team_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Ranks roster players by extracted points and keeps a bounded top-N.
#[derive(Debug, Clone)]
pub struct TopPerformerAggregator {
    top_n: usize,
}

impl Default for TopPerformerAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl TopPerformerAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Aggregate top performers for every team in the league.
    ///
    /// `player_stats` holds the raw player-stats documents. They are only
    /// decoded when the roster yields no points at all.
    pub fn aggregate(&self, league: &LeagueDocument, player_stats: &[String]) -> TeamPerformers {
        let mut collected: HashMap<String, Vec<TopPerformer>> = HashMap::new();
        for team in league.teams() {
            let entries = team
                .roster
                .iter()
                .filter_map(|p| {
                    p.points.map(|points| TopPerformer {
                        name: p.display_name.clone(),
                        points,
                    })
                })
                .collect();
            collected.insert(team.team_key.clone(), entries);
        }

        let primary_has_points = collected.values().any(|entries| !entries.is_empty());
        let source = if primary_has_points {
            PointsSource::Roster
        } else {
            info!(
                documents = player_stats.len(),
                "No roster points in scoreboard, reading player stats"
            );
            collected = self.collect_from_player_stats(league, player_stats);
            PointsSource::PlayerStats
        };

        let by_team = collected
            .into_iter()
            .map(|(team_key, entries)| (team_key, self.rank(entries)))
            .collect();

        TeamPerformers { by_team, source }
    }

    /// Sort descending by points (stable, so ties keep scan order) and
    /// truncate to top-N.
    fn rank(&self, mut entries: Vec<TopPerformer>) -> Vec<TopPerformer> {
        entries.sort_by(|a, b| b.points.total_cmp(&a.points));
        entries.truncate(self.top_n);
        entries
    }

    fn collect_from_player_stats(
        &self,
        league: &LeagueDocument,
        player_stats: &[String],
    ) -> HashMap<String, Vec<TopPerformer>> {
        // player key → team key, from the primary rosters
        let mut membership: HashMap<&str, &str> = HashMap::new();
        let mut collected: HashMap<String, Vec<TopPerformer>> = HashMap::new();
        for team in league.teams() {
            collected.insert(team.team_key.clone(), Vec::new());
            for player in &team.roster {
                if !player.key.is_empty() {
                    membership.insert(player.key.as_str(), team.team_key.as_str());
                }
            }
        }

        for (chunk, raw) in player_stats.iter().enumerate() {
            let tree = match xml::parse(raw) {
                Ok(tree) => tree,
                Err(e) => {
                    warn!(chunk, error = %e, "Skipping unreadable player-stats document");
                    continue;
                }
            };

            let players = as_sequence(lookup(&tree, &["fantasy_content", "players", "player"]));
            debug!(chunk, players = players.len(), "Reading player-stats document");

            for node in players {
                let player = parse_player(node);
                let (Some(team_key), Some(points)) =
                    (membership.get(player.key.as_str()), player.points)
                else {
                    continue;
                };
                if let Some(entries) = collected.get_mut(*team_key) {
                    entries.push(TopPerformer {
                        name: player.display_name,
                        points,
                    });
                }
            }
        }

        collected
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchupRecord, PlayerRecord, TeamRecord};

    fn player(key: &str, name: &str, points: Option<f64>) -> PlayerRecord {
        PlayerRecord {
            key: key.to_string(),
            display_name: name.to_string(),
            points,
        }
    }

    fn team(key: &str, roster: Vec<PlayerRecord>) -> TeamRecord {
        TeamRecord {
            name: key.to_uppercase(),
            team_key: key.to_string(),
            total_points: 100.0,
            roster,
        }
    }

    fn league(a: TeamRecord, b: TeamRecord) -> LeagueDocument {
        LeagueDocument {
            id: "1".into(),
            name: "Test".into(),
            week: 4,
            matchups: vec![MatchupRecord {
                team_a: a,
                team_b: b,
                winner_key: None,
            }],
        }
    }

    fn stats_doc(players: &[(&str, &str, &str)]) -> String {
        let body: String = players
            .iter()
            .map(|(key, name, total)| {
                format!(
                    "<player><player_key>{key}</player_key><name><full>{name}</full></name>\
                     <player_points><coverage_type>week</coverage_type><week>4</week><total>{total}</total></player_points></player>"
                )
            })
            .collect();
        format!("<fantasy_content><players>{body}</players></fantasy_content>")
    }

    #[test]
    fn test_top_n_sorted_and_bounded() {
        let l = league(
            team(
                "a",
                vec![
                    player("1", "Low", Some(3.0)),
                    player("2", "High", Some(25.0)),
                    player("3", "Mid", Some(12.0)),
                    player("4", "Absent", None),
                ],
            ),
            team("b", vec![player("5", "Only", Some(7.0))]),
        );
        let out = TopPerformerAggregator::default().aggregate(&l, &[]);
        assert_eq!(out.source, PointsSource::Roster);
        let a: Vec<_> = out.for_team("a").iter().map(|p| p.name.as_str()).collect();
        assert_eq!(a, vec!["High", "Mid"]);
        // min(M, N) entries
        assert_eq!(out.for_team("b").len(), 1);
    }

    #[test]
    fn test_configurable_bound() {
        let roster = (0..6)
            .map(|i| player(&i.to_string(), &format!("P{i}"), Some(i as f64)))
            .collect();
        let l = league(team("a", roster), team("b", vec![]));
        let out = TopPerformerAggregator::new(4).aggregate(&l, &[]);
        let points: Vec<_> = out.for_team("a").iter().map(|p| p.points).collect();
        assert_eq!(points, vec![5.0, 4.0, 3.0, 2.0]);
        assert!(out.for_team("b").is_empty());
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let l = league(
            team(
                "a",
                vec![
                    player("1", "First", Some(10.0)),
                    player("2", "Second", Some(10.0)),
                    player("3", "Third", Some(10.0)),
                ],
            ),
            team("b", vec![]),
        );
        let out = TopPerformerAggregator::default().aggregate(&l, &[]);
        let names: Vec<_> = out.for_team("a").iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_absent_is_dropped_not_zeroed() {
        let l = league(
            team("a", vec![player("1", "Zero", Some(0.0)), player("2", "None", None)]),
            team("b", vec![]),
        );
        let out = TopPerformerAggregator::default().aggregate(&l, &[]);
        assert_eq!(out.for_team("a").len(), 1);
        assert_eq!(out.for_team("a")[0].name, "Zero");
    }

    #[test]
    fn test_fallback_not_consulted_when_any_roster_points() {
        let l = league(
            team("a", vec![player("1", "Scored", Some(4.0))]),
            team("b", vec![player("2", "Blank", None)]),
        );
        // A stats document that would give team b a performer if read.
        let stats = vec![stats_doc(&[("2", "Blank", "30.0")])];
        let out = TopPerformerAggregator::default().aggregate(&l, &stats);
        assert_eq!(out.source, PointsSource::Roster);
        assert!(out.for_team("b").is_empty());
    }

    #[test]
    fn test_fallback_reads_player_stats_chunks() {
        let l = league(
            team("a", vec![player("1", "A1", None), player("2", "A2", None)]),
            team("b", vec![player("3", "B1", None)]),
        );
        let stats = vec![
            stats_doc(&[("1", "A1", "8.5"), ("3", "B1", "11.0")]),
            stats_doc(&[("2", "A2", "19.25"), ("99", "Stranger", "50.0")]),
        ];
        let out = TopPerformerAggregator::default().aggregate(&l, &stats);
        assert_eq!(out.source, PointsSource::PlayerStats);
        let a: Vec<_> = out.for_team("a").iter().map(|p| (p.name.as_str(), p.points)).collect();
        assert_eq!(a, vec![("A2", 19.25), ("A1", 8.5)]);
        assert_eq!(out.for_team("b")[0].points, 11.0);
    }

    #[test]
    fn test_fallback_skips_unreadable_chunk() {
        let l = league(
            team("a", vec![player("1", "A1", None)]),
            team("b", vec![player("2", "B1", None)]),
        );
        let stats = vec![
            "<fantasy_content><players>".to_string(),
            stats_doc(&[("2", "B1", "6.0")]),
        ];
        let out = TopPerformerAggregator::default().aggregate(&l, &stats);
        assert!(out.for_team("a").is_empty());
        assert_eq!(out.for_team("b").len(), 1);
    }

    #[test]
    fn test_single_player_stats_document() {
        let l = league(team("a", vec![player("1", "A1", None)]), team("b", vec![]));
        let stats = vec![stats_doc(&[("1", "A1", "2.0")])];
        let out = TopPerformerAggregator::default().aggregate(&l, &stats);
        assert_eq!(out.for_team("a")[0].points, 2.0);
    }

    #[test]
    fn test_unknown_team_is_empty() {
        let l = league(team("a", vec![]), team("b", vec![]));
        let out = TopPerformerAggregator::default().aggregate(&l, &[]);
        assert!(out.for_team("zzz").is_empty());
    }
}
