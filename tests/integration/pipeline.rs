//! End-to-end recap runs against fake collaborators.

use std::sync::Arc;
use std::time::Duration;

use fantasy_recap::recap::{RecapPipeline, RecapSettings};
use fantasy_recap::types::{RecapRequest, RecapStatus};

use crate::fakes::{FakeGenerator, RecordingNotifier};
use crate::fixtures::{self, player, player_stats, scoreboard, team};

fn pipeline(generator: &FakeGenerator, notifier: &RecordingNotifier) -> RecapPipeline {
    RecapPipeline::new(
        Some(Arc::new(generator.clone())),
        Arc::new(notifier.clone()),
        RecapSettings::default(),
    )
}

fn request(scoreboard: String, player_stats: Vec<String>, mood: &str) -> RecapRequest {
    RecapRequest {
        scoreboard,
        player_stats,
        mood: mood.to_string(),
    }
}

fn markup(status: RecapStatus) -> String {
    match status {
        RecapStatus::Success { markup } => markup,
        RecapStatus::Failure { reason, .. } => panic!("expected success, got failure: {reason}"),
    }
}

#[tokio::test]
async fn test_two_matchup_week_end_to_end() {
    let generator = FakeGenerator::new();
    let notifier = RecordingNotifier::new();

    let doc = markup(
        pipeline(&generator, &notifier)
            .run(request(fixtures::two_matchup_week(), vec![], "pirate"))
            .await,
    );

    assert!(doc.starts_with("<h1>🏈 Gridiron Legends - Week 6 🏈</h1>"));
    assert_eq!(doc.matches("<h3>").count(), 2);
    assert!(doc.contains("<h3>Matchup 1: A 🆚 B</h3>"));
    assert!(doc.contains("<h3>Matchup 2: D 🆚 C</h3>"));
    assert!(doc.contains("📊 Score: 120.50 - 110.20"));
    assert!(doc.contains("📊 Score: 130.80 - 95.00"));
    assert!(doc.contains("Highest: D with 130.80 points"));
    assert!(doc.contains("Lowest: C with 95.00 points"));

    let first = doc.find("Summary: Model recap of A vs B.").unwrap();
    let second = doc.find("Summary: Model recap of C vs D.").unwrap();
    assert!(first < second);

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    let ab = prompts.iter().find(|p| p.contains("Matchup: A vs B")).unwrap();
    assert!(ab.contains("Theme/mood: pirate"));
    assert!(ab.contains("Week: 6"));
    assert!(ab.contains("Top performers for A: Alpha Passer (31.70 pts), Alpha Runner (24.30 pts)"));
    assert!(!ab.contains("Alpha Kicker"));
    let cd = prompts.iter().find(|p| p.contains("Matchup: C vs D")).unwrap();
    assert!(cd.contains("Winner: D"));
    assert!(cd.contains("Top performers for C: n/a"));
    // Equal points keep roster order.
    assert!(cd.contains("Delta Back (27.15 pts), Delta Receiver (27.15 pts)"));
}

#[tokio::test]
async fn test_failed_matchup_gets_fallback_others_unaffected() {
    let generator = FakeGenerator::new().fail_when("Matchup: C vs D", "HTTP 500");
    let notifier = RecordingNotifier::new();

    let doc = markup(
        pipeline(&generator, &notifier)
            .run(request(fixtures::two_matchup_week(), vec![], "neutral"))
            .await,
    );

    assert!(doc.contains("Summary: Model recap of A vs B."));
    assert!(doc.contains("Summary: 🔥 D topped C 130.80 to 95.00, a margin of 35.80 points."));
    assert!(doc.contains("Delta Back led D with 27.15 points."));
    assert!(!doc.contains("HTTP 500"));
}

#[tokio::test]
async fn test_every_generation_call_failing_still_succeeds() {
    let generator = FakeGenerator::new().fail_when("Matchup:", "service unavailable");
    let notifier = RecordingNotifier::new();

    let doc = markup(
        pipeline(&generator, &notifier)
            .run(request(fixtures::two_matchup_week(), vec![], "neutral"))
            .await,
    );

    assert_eq!(doc.matches("<h3>").count(), 2);
    assert!(doc.contains("Summary: 🏈 A beat B 120.50 to 110.20, a margin of 10.30 points."));
    assert!(doc.contains("Summary: 🔥 D topped C"));
    assert!(doc.contains("Highest: D with 130.80 points"));
    assert!(!doc.contains("Model recap"));

    let status = notifier.wait_for_message().await.unwrap();
    assert!(status.contains("2 fallback"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_matchup_times_out_to_fallback() {
    let generator = FakeGenerator::new().delay_when("Matchup: A vs B", Duration::from_secs(30));
    let notifier = RecordingNotifier::new();

    let doc = markup(
        pipeline(&generator, &notifier)
            .run(request(fixtures::two_matchup_week(), vec![], ""))
            .await,
    );

    assert!(doc.contains("Summary: 🏈 A beat B 120.50 to 110.20"));
    assert!(doc.contains("Summary: Model recap of C vs D."));
}

#[tokio::test]
async fn test_blank_model_text_gets_fallback() {
    let generator = FakeGenerator::new().empty_when("Matchup: A vs B");
    let notifier = RecordingNotifier::new();

    let doc = markup(
        pipeline(&generator, &notifier)
            .run(request(fixtures::two_matchup_week(), vec![], "neutral"))
            .await,
    );

    assert!(doc.contains("Summary: 🏈 A beat B"));
    assert!(doc.contains("Alpha Passer led A with 31.70 points."));
    assert!(doc.contains("Bravo Wideout put up 18.40 for B in a losing effort."));
}

#[tokio::test]
async fn test_player_stats_used_when_rosters_have_no_points() {
    let board = scoreboard(
        "Stats League",
        &[(
            team(
                "t.1",
                "Home",
                "88.8",
                vec![player("p.1", "Home One", None), player("p.2", "Home Two", None)],
            ),
            team("t.2", "Away", "77.7", vec![player("p.3", "Away One", None)]),
            Some("t.1"),
        )],
    );
    // Batches merge by concatenation; a player on no roster is ignored.
    let stats = vec![
        player_stats(&[player("p.1", "Home One", Some("12.5")), player("p.9", "Free Agent", Some("40.0"))]),
        player_stats(&[player("p.2", "Home Two", Some("19.25")), player("p.3", "Away One", Some("7"))]),
        "<fantasy_content><players>".to_string(),
    ];
    let generator = FakeGenerator::new();
    let notifier = RecordingNotifier::new();

    markup(
        pipeline(&generator, &notifier)
            .run(request(board, stats, "noir"))
            .await,
    );

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Top performers for Home: Home Two (19.25 pts), Home One (12.50 pts)"));
    assert!(prompt.contains("Top performers for Away: Away One (7.00 pts)"));
    assert!(!prompt.contains("Free Agent"));
}

#[tokio::test]
async fn test_declared_winner_trusted_over_score() {
    let board = scoreboard(
        "Upset League",
        &[(
            team("t.1", "Higher", "101.5", vec![]),
            team("t.2", "Declared", "90.0", vec![]),
            Some("t.2"),
        )],
    );
    let generator = FakeGenerator::new();
    let notifier = RecordingNotifier::new();

    let doc = markup(pipeline(&generator, &notifier).run(request(board, vec![], "")).await);

    assert!(doc.contains("<h3>Matchup 1: Declared 🆚 Higher</h3>"));
    assert!(doc.contains("🏆 Winner: Declared"));
    // Score line and footer still go by points.
    assert!(doc.contains("📊 Score: 101.50 - 90.00"));
    assert!(doc.contains("Highest: Higher with 101.50 points"));
}

#[tokio::test]
async fn test_malformed_scoreboard_is_client_failure() {
    let generator = FakeGenerator::new();
    let notifier = RecordingNotifier::new();

    let status = pipeline(&generator, &notifier)
        .run(request("<fantasy_content><league>".into(), vec![], "hype"))
        .await;

    assert!(matches!(status, RecapStatus::Failure { client_error: true, .. }));
    assert!(generator.prompts().is_empty());
    let message = notifier.wait_for_message().await.unwrap();
    assert!(message.contains("failed"));
}

#[tokio::test]
async fn test_three_team_matchup_aborts_run() {
    let raw = fixtures::two_matchup_week().replace(
        "</teams></matchup><matchup>",
        "<team><team_key>t.z</team_key><name>Z</name><team_points><total>1</total></team_points></team>\
         </teams></matchup><matchup>",
    );
    let generator = FakeGenerator::new();
    let notifier = RecordingNotifier::new();

    let status = pipeline(&generator, &notifier).run(request(raw, vec![], "")).await;

    match status {
        RecapStatus::Failure { reason, client_error } => {
            assert!(client_error);
            assert!(reason.contains("matchup[0].teams.team"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn test_league_without_matchups_is_client_failure() {
    let generator = FakeGenerator::new();
    let notifier = RecordingNotifier::new();

    let status = pipeline(&generator, &notifier)
        .run(request(scoreboard("Empty", &[]), vec![], ""))
        .await;

    assert!(matches!(status, RecapStatus::Failure { client_error: true, .. }));
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_work() {
    let notifier = RecordingNotifier::new();
    let pipeline = RecapPipeline::new(None, Arc::new(notifier.clone()), RecapSettings::default());

    let status = pipeline
        .run(request(fixtures::two_matchup_week(), vec![], ""))
        .await;

    assert!(matches!(status, RecapStatus::Failure { client_error: false, .. }));
}

#[tokio::test]
async fn test_notification_failure_does_not_change_result() {
    let generator = FakeGenerator::new();
    let notifier = RecordingNotifier::failing();

    let status = pipeline(&generator, &notifier)
        .run(request(fixtures::two_matchup_week(), vec![], ""))
        .await;

    assert!(matches!(status, RecapStatus::Success { .. }));
    let message = notifier.wait_for_message().await.unwrap();
    assert!(message.contains("Gridiron Legends week 6"));
}

#[tokio::test]
async fn test_identical_input_gives_identical_markup() {
    let generator = FakeGenerator::new().fail_when("Matchup: A vs B", "boom");
    let notifier = RecordingNotifier::new();
    let pipeline = pipeline(&generator, &notifier);

    let first = markup(pipeline.run(request(fixtures::two_matchup_week(), vec![], "snark")).await);
    let second = markup(pipeline.run(request(fixtures::two_matchup_week(), vec![], "snark")).await);

    assert_eq!(first, second);
}
