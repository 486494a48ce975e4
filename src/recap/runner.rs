//! Bounded-concurrency generation runner.
//!
//! Dispatches one generation call per matchup with at most `max_concurrency`
//! in flight. Each call has its own timeout and its own fallback, so the
//! runner itself cannot fail. Results land in a pre-sized slot vector by
//! matchup index, so output order is input order whatever order the calls
//! finish in.

use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::fallback::fallback_text;
use crate::llm::{GenerationRequest, TextGenerator, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::types::{CompactMatchupView, FragmentSource, GeneratedFragment};

/// Default number of generation calls in flight.
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;
/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(6_500);

/// Runner tunables.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub max_concurrency: usize,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// One unit of work: a prompt plus what is needed to write its fallback.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub prompt: String,
    pub view: CompactMatchupView,
    pub mood: String,
}

pub struct GenerationRunner<'a> {
    generator: &'a dyn TextGenerator,
    config: RunnerConfig,
}

impl<'a> GenerationRunner<'a> {
    pub fn new(generator: &'a dyn TextGenerator, config: RunnerConfig) -> Self {
        Self { generator, config }
    }

    /// Run every job and return one fragment per job, in job order.
    pub async fn run_all(&self, jobs: &[GenerationJob]) -> Vec<GeneratedFragment> {
        let width = self.config.max_concurrency.max(1);
        info!(jobs = jobs.len(), concurrency = width, "Dispatching recap generation");

        let mut slots: Vec<Option<GeneratedFragment>> = vec![None; jobs.len()];

        // Built up front so the stream type holds no closure; the caller's
        // future must stay Send for axum handlers.
        let pending: Vec<_> = jobs
            .iter()
            .enumerate()
            .map(|(index, job)| async move { (index, self.run_one(index, job).await) })
            .collect();
        let mut completed = stream::iter(pending).buffer_unordered(width);

        while let Some((index, fragment)) = completed.next().await {
            slots[index] = Some(fragment);
        }

        let fragments: Vec<GeneratedFragment> = slots
            .into_iter()
            .zip(jobs)
            .enumerate()
            .map(|(index, (slot, job))| {
                slot.unwrap_or_else(|| fallback_fragment(index, job))
            })
            .collect();

        let fallbacks = fragments
            .iter()
            .filter(|f| f.source == FragmentSource::Fallback)
            .count();
        info!(total = fragments.len(), fallbacks, "Recap generation complete");

        fragments
    }

    async fn run_one(&self, index: usize, job: &GenerationJob) -> GeneratedFragment {
        let request = GenerationRequest {
            prompt: job.prompt.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let outcome = tokio::time::timeout(self.config.timeout, self.generator.generate(&request)).await;

        match outcome {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                debug!(matchup = index, chars = text.len(), "Generated recap");
                GeneratedFragment {
                    matchup_index: index,
                    text: text.trim().to_string(),
                    source: FragmentSource::Model,
                }
            }
            Ok(Ok(_)) => {
                warn!(matchup = index, "Generation returned empty text, using fallback");
                fallback_fragment(index, job)
            }
            Ok(Err(e)) => {
                warn!(matchup = index, error = %e, "Generation failed, using fallback");
                fallback_fragment(index, job)
            }
            Err(_) => {
                warn!(
                    matchup = index,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Generation timed out, using fallback"
                );
                fallback_fragment(index, job)
            }
        }
    }
}

fn fallback_fragment(index: usize, job: &GenerationJob) -> GeneratedFragment {
    GeneratedFragment {
        matchup_index: index,
        text: fallback_text(&job.view, index, &job.mood),
        source: FragmentSource::Fallback,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
