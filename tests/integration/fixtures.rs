//! Provider-shaped XML documents.

pub struct Player<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub points: Option<&'a str>,
}

pub struct Team<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub total: &'a str,
    pub roster: Vec<Player<'a>>,
}

pub fn player<'a>(key: &'a str, name: &'a str, points: Option<&'a str>) -> Player<'a> {
    Player { key, name, points }
}

pub fn team<'a>(key: &'a str, name: &'a str, total: &'a str, roster: Vec<Player<'a>>) -> Team<'a> {
    Team {
        key,
        name,
        total,
        roster,
    }
}

fn player_xml(p: &Player) -> String {
    let points = p
        .points
        .map(|total| {
            format!(
                "<player_points><coverage_type>week</coverage_type><week>6</week>\
                 <total>{total}</total></player_points>"
            )
        })
        .unwrap_or_default();
    format!(
        "<player><player_key>{}</player_key><name><full>{}</full></name>{points}</player>",
        p.key, p.name
    )
}

fn team_xml(t: &Team) -> String {
    let players: String = t.roster.iter().map(player_xml).collect();
    format!(
        "<team><team_key>{}</team_key><name>{}</name>\
         <team_points><coverage_type>week</coverage_type><week>6</week><total>{}</total></team_points>\
         <roster><players>{players}</players></roster></team>",
        t.key, t.name, t.total
    )
}

/// A week-6 scoreboard for `league_name` with the given matchups.
/// `winner` is the declared winner's team key, if any.
pub fn scoreboard(league_name: &str, matchups: &[(Team, Team, Option<&str>)]) -> String {
    let body: String = matchups
        .iter()
        .map(|(a, b, winner)| {
            let winner = winner
                .map(|k| format!("<winner_team_key>{k}</winner_team_key>"))
                .unwrap_or_default();
            format!(
                "<matchup><week>6</week><status>postevent</status>{winner}\
                 <teams>{}{}</teams></matchup>",
                team_xml(a),
                team_xml(b)
            )
        })
        .collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <fantasy_content xml:lang=\"en-US\" copyright=\"test\">\
         <league><league_key>nfl.l.4242</league_key><league_id>4242</league_id>\
         <name>{league_name}</name><scoreboard><week>6</week>\
         <matchups count=\"{}\">{body}</matchups></scoreboard></league></fantasy_content>",
        matchups.len()
    )
}

/// A player-stats document as returned for one key batch.
pub fn player_stats(players: &[Player]) -> String {
    let body: String = players.iter().map(player_xml).collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <fantasy_content><players count=\"{}\">{body}</players></fantasy_content>",
        players.len()
    )
}

/// Two matchups: A 120.5 over B 110.2, and D 130.8 over C 95.0.
pub fn two_matchup_week() -> String {
    scoreboard(
        "Gridiron Legends",
        &[
            (
                team(
                    "t.a",
                    "A",
                    "120.5",
                    vec![
                        player("p.a1", "Alpha Runner", Some("24.3")),
                        player("p.a2", "Alpha Passer", Some("31.7")),
                        player("p.a3", "Alpha Kicker", Some("9.0")),
                    ],
                ),
                team("t.b", "B", "110.2", vec![player("p.b1", "Bravo Wideout", Some("18.4"))]),
                Some("t.a"),
            ),
            (
                team("t.c", "C", "95.0", vec![player("p.c1", "Charlie Tight End", None)]),
                team(
                    "t.d",
                    "D",
                    "130.8",
                    vec![
                        player("p.d1", "Delta Back", Some("27.15")),
                        player("p.d2", "Delta Receiver", Some("27.15")),
                    ],
                ),
                Some("t.d"),
            ),
        ],
    )
}
