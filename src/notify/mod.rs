//! Notification sink for pipeline outcomes.
//!
//! Each recap run ends with one status line. Delivery is fire-and-forget:
//! the pipeline spawns the send and never awaits it, so a slow or failing
//! sink cannot change what the run returns.

pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Writes status lines through `tracing`. Used when no remote sink is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        info!(status = %message, "Recap status");
        Ok(())
    }
}

/// Send `message` in the background. Sink errors are logged and dropped.
pub fn dispatch(notifier: Arc<dyn Notifier>, message: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&message).await {
            warn!(error = %e, "Notification delivery failed");
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
