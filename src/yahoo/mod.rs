//! Yahoo Fantasy Sports league-data client.
//!
//! API docs: https://developer.yahoo.com/fantasysports/guide/
//! Base URL: https://fantasysports.yahooapis.com/fantasy/v2
//! Auth: OAuth 2.0 bearer token (see [`auth`]).
//! Responses are XML and are passed through raw; only the player keys are
//! read here, to drive the batched player-stats fetch.

pub mod auth;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

use self::auth::{AuthProvider, TokenSet};
use crate::document::normalize::{as_sequence, lookup, scalar_text};
use crate::document::xml;
use crate::types::RecapError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://fantasysports.yahooapis.com/fantasy/v2";
const PROVIDER: &str = "yahoo";

/// Game code used in league keys (`nfl.l.{league_id}`).
pub const DEFAULT_GAME_KEY: &str = "nfl";

/// Most player keys the stats endpoint accepts per call.
pub const MAX_STATS_BATCH: usize = 25;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub league_id: String,
    pub name: String,
}

/// Raw scoreboard document plus its player-stats documents, one per batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreboardBundle {
    pub scoreboard: String,
    pub player_stats: Vec<String>,
}

/// A provider call's result plus the replacement tokens if a refresh
/// happened on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Refreshed<T> {
    pub value: T,
    pub new_tokens: Option<TokenSet>,
}

/// Source of raw league documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeagueDataProvider: Send + Sync {
    /// Leagues the token's user belongs to.
    async fn fetch_leagues(&self, access_token: &str) -> Result<Vec<LeagueSummary>, RecapError>;

    /// Scoreboard with rosters for one week, plus batched player stats.
    async fn fetch_scoreboard(
        &self,
        access_token: &str,
        league_id: &str,
        week: u32,
    ) -> Result<ScoreboardBundle, RecapError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct YahooClient {
    http: Client,
    base_url: String,
    game_key: String,
    batch_size: usize,
}

impl YahooClient {
    pub fn new(batch_size: usize) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("Failed to build Yahoo HTTP client")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            game_key: DEFAULT_GAME_KEY.to_string(),
            batch_size: batch_size.clamp(1, MAX_STATS_BATCH),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn leagues_url(&self) -> String {
        format!(
            "{}/users;use_login=1/games;game_keys={}/leagues",
            self.base_url, self.game_key
        )
    }

    fn scoreboard_url(&self, league_id: &str, week: u32) -> String {
        format!(
            "{}/league/{}.l.{}/scoreboard;week={week}/matchups/teams/roster/players",
            self.base_url,
            self.game_key,
            urlencoding::encode(league_id)
        )
    }

    fn player_stats_url(&self, keys: &[String], week: u32) -> String {
        format!(
            "{}/players;player_keys={}/stats;type=week;week={week}",
            self.base_url,
            keys.join(",")
        )
    }

    async fn get_xml(&self, access_token: &str, url: &str) -> Result<String, RecapError> {
        debug!(url, "Yahoo request");
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| upstream(format!("Request error: {e}")))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(RecapError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, url, "Yahoo API error");
            return Err(upstream(format!("HTTP {status}: {body}")));
        }

        response
            .text()
            .await
            .map_err(|e| upstream(format!("Failed to read response body: {e}")))
    }
}

#[async_trait]
impl LeagueDataProvider for YahooClient {
    async fn fetch_leagues(&self, access_token: &str) -> Result<Vec<LeagueSummary>, RecapError> {
        let raw = self.get_xml(access_token, &self.leagues_url()).await?;
        let leagues = parse_leagues(&raw)?;
        info!(count = leagues.len(), "Fetched leagues");
        Ok(leagues)
    }

    async fn fetch_scoreboard(
        &self,
        access_token: &str,
        league_id: &str,
        week: u32,
    ) -> Result<ScoreboardBundle, RecapError> {
        let scoreboard = self
            .get_xml(access_token, &self.scoreboard_url(league_id, week))
            .await?;

        let keys = collect_player_keys(&scoreboard)?;
        let batches: Vec<&[String]> = keys.chunks(self.batch_size).collect();
        info!(
            league_id,
            week,
            players = keys.len(),
            batches = batches.len(),
            "Fetching player stats"
        );

        // Batches run concurrently; try_join_all keeps batch order.
        let player_stats = try_join_all(batches.iter().map(|batch| {
            let url = self.player_stats_url(batch, week);
            async move { self.get_xml(access_token, &url).await }
        }))
        .await?;

        Ok(ScoreboardBundle {
            scoreboard,
            player_stats,
        })
    }
}

fn upstream(message: String) -> RecapError {
    RecapError::Upstream {
        provider: PROVIDER.into(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Document helpers
// ---------------------------------------------------------------------------

/// League ids and names from a `users;use_login=1/games/leagues` document.
pub fn parse_leagues(raw: &str) -> Result<Vec<LeagueSummary>, RecapError> {
    let tree = xml::parse(raw)?;
    let mut leagues = Vec::new();

    for user in as_sequence(lookup(&tree, &["fantasy_content", "users", "user"])) {
        for game in as_sequence(lookup(user, &["games", "game"])) {
            for league in as_sequence(lookup(game, &["leagues", "league"])) {
                let league_id = lookup(league, &["league_id"])
                    .and_then(scalar_text)
                    .unwrap_or_default();
                if league_id.is_empty() {
                    continue;
                }
                let name = lookup(league, &["name"])
                    .and_then(scalar_text)
                    .unwrap_or_default();
                leagues.push(LeagueSummary { league_id, name });
            }
        }
    }

    Ok(leagues)
}

/// Every roster player key in a scoreboard document, in document order.
pub fn collect_player_keys(raw: &str) -> Result<Vec<String>, RecapError> {
    let tree = xml::parse(raw)?;
    let matchups = lookup(
        &tree,
        &["fantasy_content", "league", "scoreboard", "matchups", "matchup"],
    );

    let keys = as_sequence(matchups)
        .into_iter()
        .flat_map(|m| as_sequence(lookup(m, &["teams", "team"])))
        .flat_map(|t| as_sequence(lookup(t, &["roster", "players", "player"])))
        .filter_map(|p| lookup(p, &["player_key"]).and_then(scalar_text))
        .filter(|k| !k.is_empty())
        .collect();

    Ok(keys)
}

/// Run `call` with `access_token`; on [`RecapError::Unauthorized`] and a
/// refresh token, refresh once and retry with the new access token.
///
/// A failed refresh surfaces as `Unauthorized`.
pub async fn with_refresh<T, F, Fut>(
    auth: &dyn AuthProvider,
    access_token: &str,
    refresh_token: Option<&str>,
    call: F,
) -> Result<Refreshed<T>, RecapError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, RecapError>>,
{
    match call(access_token.to_string()).await {
        Ok(value) => Ok(Refreshed {
            value,
            new_tokens: None,
        }),
        Err(RecapError::Unauthorized) => {
            let Some(refresh_token) = refresh_token.filter(|t| !t.is_empty()) else {
                return Err(RecapError::Unauthorized);
            };
            info!("Access token rejected, refreshing");
            let tokens = auth.refresh(refresh_token).await.map_err(|e| {
                warn!(error = %e, "Token refresh failed");
                RecapError::Unauthorized
            })?;
            let value = call(tokens.access_token.clone()).await?;
            Ok(Refreshed {
                value,
                new_tokens: Some(tokens),
            })
        }
        Err(other) => Err(other),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
