//! Deterministic in-memory collaborators.
//!
//! `FakeGenerator` answers from the prompt itself, so expected output can be
//! computed by the test. Failures and delays are keyed on a substring of the
//! prompt (e.g. a team name). `RecordingNotifier` keeps every status line.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fantasy_recap::llm::{GenerationRequest, TextGenerator};
use fantasy_recap::notify::Notifier;

#[derive(Clone)]
enum Behaviour {
    Fail(String),
    Empty,
    Delay(Duration),
}

/// A text generator whose replies are derived from the prompt.
#[derive(Clone, Default)]
pub struct FakeGenerator {
    rules: Vec<(String, Behaviour)>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every prompt containing `needle`.
    pub fn fail_when(mut self, needle: &str, error: &str) -> Self {
        self.rules.push((needle.to_string(), Behaviour::Fail(error.to_string())));
        self
    }

    /// Return whitespace for every prompt containing `needle`.
    pub fn empty_when(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Behaviour::Empty));
        self
    }

    /// Sleep before answering prompts containing `needle`.
    pub fn delay_when(mut self, needle: &str, delay: Duration) -> Self {
        self.rules.push((needle.to_string(), Behaviour::Delay(delay)));
        self
    }

    /// Every prompt received so far, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// The reply given for a prompt that triggers no rule.
    pub fn reply_for(prompt: &str) -> String {
        let matchup = prompt
            .lines()
            .find_map(|l| l.strip_prefix("Matchup: "))
            .unwrap_or("unknown matchup");
        format!("Model recap of {matchup}.")
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        for (needle, behaviour) in &self.rules {
            if !request.prompt.contains(needle.as_str()) {
                continue;
            }
            match behaviour {
                Behaviour::Fail(e) => return Err(anyhow!("{e}")),
                Behaviour::Empty => return Ok("  \n ".to_string()),
                Behaviour::Delay(d) => tokio::time::sleep(*d).await,
            }
        }

        Ok(Self::reply_for(&request.prompt))
    }

    fn model_name(&self) -> String {
        "fake".to_string()
    }
}

/// Keeps every status line it is sent. Optionally fails after recording.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Yield until the background send has landed.
    pub async fn wait_for_message(&self) -> Option<String> {
        for _ in 0..100 {
            if let Some(m) = self.messages().first() {
                return Some(m.clone());
            }
            tokio::task::yield_now().await;
        }
        None
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(anyhow!("notification sink unavailable"));
        }
        Ok(())
    }
}
