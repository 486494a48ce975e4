//! Fantasy football weekly recap generator.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the provider clients into the recap pipeline and serves the
//! HTTP API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use fantasy_recap::config::{self, AppConfig};
use fantasy_recap::llm::openai::OpenAiClient;
use fantasy_recap::llm::TextGenerator;
use fantasy_recap::logging;
use fantasy_recap::notify::telegram::TelegramNotifier;
use fantasy_recap::notify::{LogNotifier, Notifier};
use fantasy_recap::recap::RecapPipeline;
use fantasy_recap::server::{self, ServerState};
use fantasy_recap::yahoo::auth::YahooAuth;
use fantasy_recap::yahoo::YahooClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("FANTASY_RECAP_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = if std::path::Path::new(&config_path).exists() {
        AppConfig::load(&config_path)?
    } else {
        AppConfig::default()
    };

    logging::init(&cfg.logging.sink(), cfg.logging.json)?;

    info!(
        config = %config_path,
        model = %cfg.llm.model,
        top_n = cfg.recap.top_n,
        concurrency = cfg.recap.max_concurrency,
        timeout_ms = cfg.recap.generation_timeout_ms,
        "Fantasy recap starting up"
    );

    let generator = build_generator(&cfg)?;
    let notifier = build_notifier(&cfg.alerts)?;

    let auth = YahooAuth::new(
        AppConfig::resolve_env(&cfg.yahoo.client_id_env).ok(),
        AppConfig::resolve_secret(&cfg.yahoo.client_secret_env),
        cfg.yahoo.redirect_uri.clone(),
    )?;
    let league_data = YahooClient::new(cfg.recap.stats_batch_size)?;

    let state = Arc::new(ServerState {
        pipeline: RecapPipeline::new(generator, notifier, cfg.recap.settings()),
        league_data: Arc::new(league_data),
        auth: Arc::new(auth),
    });

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    server::serve(state, &addr).await?;

    info!("Fantasy recap shut down cleanly.");
    Ok(())
}

/// The text generator, or `None` when no API key is configured.
fn build_generator(cfg: &AppConfig) -> Result<Option<Arc<dyn TextGenerator>>> {
    let Some(api_key) = AppConfig::resolve_secret(&cfg.llm.api_key_env) else {
        warn!(
            env = %cfg.llm.api_key_env,
            "No OpenAI API key configured; recap requests will fail"
        );
        return Ok(None);
    };

    let mut client = OpenAiClient::new(api_key, Some(cfg.llm.model.clone()))?;
    if let Some(url) = &cfg.llm.base_url {
        client = client.with_base_url(url.clone());
    }
    Ok(Some(Arc::new(client)))
}

/// Telegram when both env names resolve, the log sink otherwise.
fn build_notifier(alerts: &config::AlertsConfig) -> Result<Arc<dyn Notifier>> {
    let token = alerts
        .telegram_bot_token_env
        .as_deref()
        .and_then(AppConfig::resolve_secret);
    let chat_id = alerts
        .telegram_chat_id_env
        .as_deref()
        .and_then(|env| AppConfig::resolve_env(env).ok());

    match (token, chat_id) {
        (Some(token), Some(chat_id)) => {
            info!("Telegram notifications enabled");
            Ok(Arc::new(TelegramNotifier::new(token, chat_id)?))
        }
        _ => Ok(Arc::new(LogNotifier)),
    }
}
