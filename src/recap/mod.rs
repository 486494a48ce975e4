//! Weekly recap pipeline.
//!
//! One call to [`RecapPipeline::run`] takes the raw scoreboard and
//! player-stats documents plus a mood, and returns either the finished
//! markup or a failure reason. Upstream failures (bad document, missing
//! credential) abort before any generation call; per-matchup generation
//! failures are absorbed by the runner's fallback and never reach here.

pub mod aggregate;
pub mod assemble;
pub mod fallback;
pub mod prompt;
pub mod runner;

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::document;
use crate::llm::TextGenerator;
use crate::notify::{self, Notifier};
use crate::types::{
    CompactMatchupView, FragmentSource, LeagueDocument, RecapError, RecapRequest, RecapStatus,
    Side,
};
use aggregate::{TeamPerformers, TopPerformerAggregator, DEFAULT_TOP_N};
use prompt::{PromptBuilder, DEFAULT_MOOD};
use runner::{GenerationJob, GenerationRunner, RunnerConfig};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pipeline tunables.
#[derive(Debug, Clone)]
pub struct RecapSettings {
    pub top_n: usize,
    pub default_mood: String,
    pub style_hints: Vec<String>,
    pub runner: RunnerConfig,
}

impl Default for RecapSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            default_mood: DEFAULT_MOOD.to_string(),
            style_hints: Vec::new(),
            runner: RunnerConfig::default(),
        }
    }
}

/// What a successful run produced, kept for the status line.
struct RunOutput {
    markup: String,
    league_name: String,
    week: u32,
    matchups: usize,
    fallbacks: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct RecapPipeline {
    generator: Option<Arc<dyn TextGenerator>>,
    notifier: Arc<dyn Notifier>,
    aggregator: TopPerformerAggregator,
    prompts: PromptBuilder,
    runner_config: RunnerConfig,
    default_mood: String,
}

impl RecapPipeline {
    /// `generator` is `None` when no generation credential is configured;
    /// every run then fails with [`RecapError::MissingCredential`].
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        notifier: Arc<dyn Notifier>,
        settings: RecapSettings,
    ) -> Self {
        Self {
            generator,
            notifier,
            aggregator: TopPerformerAggregator::new(settings.top_n),
            prompts: PromptBuilder::new(settings.style_hints),
            runner_config: settings.runner,
            default_mood: settings.default_mood,
        }
    }

    /// Run one recap. Never panics on bad input and never returns a
    /// partially written body. The outcome is also sent to the
    /// notification sink in the background.
    pub async fn run(&self, request: RecapRequest) -> RecapStatus {
        let run_id = Uuid::new_v4();
        let span = info_span!("recap_run", run_id = %run_id);

        async {
            let started = Instant::now();
            match self.try_run(&request).await {
                Ok(out) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    info!(
                        league = %out.league_name,
                        week = out.week,
                        matchups = out.matchups,
                        fallbacks = out.fallbacks,
                        elapsed_ms,
                        "Recap generated"
                    );
                    notify::dispatch(
                        self.notifier.clone(),
                        format!(
                            "✅ Recap for {} week {} generated in {elapsed_ms}ms ({} matchups, {} fallback) at {}",
                            out.league_name,
                            out.week,
                            out.matchups,
                            out.fallbacks,
                            timestamp()
                        ),
                    );
                    RecapStatus::Success { markup: out.markup }
                }
                Err(e) => {
                    error!(error = %e, client_error = e.is_client_error(), "Recap failed");
                    notify::dispatch(
                        self.notifier.clone(),
                        format!("❌ Recap failed: {e} at {}", timestamp()),
                    );
                    RecapStatus::Failure {
                        reason: e.to_string(),
                        client_error: e.is_client_error(),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_run(&self, request: &RecapRequest) -> Result<RunOutput, RecapError> {
        let generator = self
            .generator
            .as_deref()
            .ok_or(RecapError::MissingCredential)?;

        let league = document::parse_scoreboard(&request.scoreboard)?;
        info!(
            league = %league.name,
            week = league.week,
            matchups = league.matchups.len(),
            "Scoreboard normalized"
        );

        for (index, matchup) in league.matchups.iter().enumerate() {
            let check = matchup.winner_check();
            if !check.is_agreed() {
                warn!(
                    matchup = index,
                    check = %check,
                    winner_key = ?matchup.winner_key,
                    labeled = %matchup.winner(),
                    score_a = matchup.team_a.total_points,
                    score_b = matchup.team_b.total_points,
                    "Winner label not confirmed by the scores"
                );
            }
        }

        let performers = self.aggregator.aggregate(&league, &request.player_stats);
        let views = compact_views(&league, &performers);

        let mood = match request.mood.trim() {
            "" => self.default_mood.as_str(),
            m => m,
        };
        let jobs: Vec<GenerationJob> = views
            .iter()
            .enumerate()
            .map(|(index, view)| GenerationJob {
                prompt: self.prompts.build(view, index, league.week, mood),
                view: view.clone(),
                mood: mood.to_string(),
            })
            .collect();

        let fragments = GenerationRunner::new(generator, self.runner_config.clone())
            .run_all(&jobs)
            .await;

        let (highest, lowest) = league.highs_and_lows().ok_or(RecapError::NoMatchups)?;
        let markup = assemble::assemble(&league.name, league.week, &views, &fragments, &highest, &lowest);

        Ok(RunOutput {
            markup,
            league_name: league.name,
            week: league.week,
            matchups: views.len(),
            fallbacks: fragments
                .iter()
                .filter(|f| f.source == FragmentSource::Fallback)
                .count(),
        })
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Project each matchup down to what generation needs.
pub fn compact_views(league: &LeagueDocument, performers: &TeamPerformers) -> Vec<CompactMatchupView> {
    league
        .matchups
        .iter()
        .map(|m| CompactMatchupView {
            team_a_name: m.team(Side::A).name.clone(),
            team_b_name: m.team(Side::B).name.clone(),
            winner: m.winner(),
            score_a: m.team_a.total_points,
            score_b: m.team_b.total_points,
            top_a: performers.for_team(&m.team_a.team_key).to_vec(),
            top_b: performers.for_team(&m.team_b.team_key).to_vec(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
