//! HTTP route handlers.
//!
//! All API endpoints speak JSON. Provider calls go through
//! [`with_refresh`], so an expired access token is refreshed once and the
//! new pair is returned to the caller alongside the payload.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::recap::RecapPipeline;
use crate::types::{RecapError, RecapRequest, RecapStatus};
use crate::yahoo::auth::{AuthProvider, TokenSet};
use crate::yahoo::{with_refresh, LeagueDataProvider, LeagueSummary};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServerState {
    pub pipeline: RecapPipeline,
    pub league_data: Arc<dyn LeagueDataProvider>,
    pub auth: Arc<dyn AuthProvider>,
}

pub type AppState = Arc<ServerState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A [`RecapError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub RecapError);

impl From<RecapError> for ApiError {
    fn from(e: RecapError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RecapError::Unauthorized => StatusCode::UNAUTHORIZED,
            RecapError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            RecapError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self.0 {
            RecapError::Unauthorized => "Authentication failed".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreboardParams {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub week: Option<String>,
    pub league_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaguesResponse {
    pub leagues: Vec<LeagueSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreboardResponse {
    pub scoreboard: String,
    #[serde(rename = "playerStats")]
    pub player_stats: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryBody {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(rename = "scoreboardData", default)]
    pub scoreboard_data: Option<ScoreboardData>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreboardData {
    #[serde(default)]
    pub scoreboard: Option<String>,
    #[serde(rename = "playerStats", default)]
    pub player_stats: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Token pair as handed to the browser.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

impl From<TokenSet> for TokenResponse {
    fn from(t: TokenSet) -> Self {
        Self {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_in: t.expires_in,
        }
    }
}

fn split_tokens(tokens: Option<TokenSet>) -> (Option<String>, Option<String>) {
    match tokens {
        Some(t) => (Some(t.access_token), Some(t.refresh_token)),
        None => (None, None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// GET /api/leagues
pub async fn get_leagues(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Response {
    let Some(access_token) = non_empty(params.access_token) else {
        return bad_request("Missing access token");
    };
    let provider = &*state.league_data;

    let result = with_refresh(
        &*state.auth,
        &access_token,
        params.refresh_token.as_deref(),
        |token| async move { provider.fetch_leagues(&token).await },
    )
    .await;

    match result {
        Ok(refreshed) => {
            let (new_access_token, new_refresh_token) = split_tokens(refreshed.new_tokens);
            Json(LeaguesResponse {
                leagues: refreshed.value,
                new_access_token,
                new_refresh_token,
            })
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch leagues");
            ApiError(e).into_response()
        }
    }
}

/// GET /api/scoreboard
pub async fn get_scoreboard(
    State(state): State<AppState>,
    Query(params): Query<ScoreboardParams>,
) -> Response {
    let (Some(access_token), Some(week), Some(league_id)) = (
        non_empty(params.access_token),
        non_empty(params.week),
        non_empty(params.league_id),
    ) else {
        return bad_request("Missing required query parameters: access_token, week, or league_id");
    };
    let Ok(week) = week.trim().parse::<u32>() else {
        return bad_request("week must be a positive integer");
    };
    if !league_id.chars().all(|c| c.is_ascii_digit()) {
        return bad_request("league_id must be numeric");
    }
    let provider = &*state.league_data;
    let league_id = league_id.as_str();

    let result = with_refresh(
        &*state.auth,
        &access_token,
        params.refresh_token.as_deref(),
        |token| async move { provider.fetch_scoreboard(&token, league_id, week).await },
    )
    .await;

    match result {
        Ok(refreshed) => {
            let (new_access_token, new_refresh_token) = split_tokens(refreshed.new_tokens);
            info!(
                league_id,
                week,
                stats_documents = refreshed.value.player_stats.len(),
                "Scoreboard fetched"
            );
            Json(ScoreboardResponse {
                scoreboard: refreshed.value.scoreboard,
                player_stats: refreshed.value.player_stats,
                new_access_token,
                new_refresh_token,
            })
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, league_id, week, "Failed to fetch scoreboard");
            ApiError(e).into_response()
        }
    }
}

/// POST /api/summary
pub async fn post_summary(State(state): State<AppState>, Json(body): Json<SummaryBody>) -> Response {
    let data = body.scoreboard_data.unwrap_or(ScoreboardData {
        scoreboard: None,
        player_stats: None,
    });
    let (Some(scoreboard), Some(player_stats)) = (non_empty(data.scoreboard), data.player_stats) else {
        return bad_request("Missing required data: scoreboardData or playerStatsData.");
    };

    let request = RecapRequest {
        scoreboard,
        player_stats,
        mood: body.mood.unwrap_or_default(),
    };

    match state.pipeline.run(request).await {
        RecapStatus::Success { markup } => Json(SummaryResponse { summary: markup }).into_response(),
        RecapStatus::Failure { reason, client_error: true } => bad_request(&reason),
        RecapStatus::Failure { reason, client_error: false } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Error generating summary: {reason}") })),
        )
            .into_response(),
    }
}

/// GET /auth/yahoo
pub async fn auth_redirect(State(state): State<AppState>) -> Response {
    match state.auth.authorize_url() {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /auth/yahoo/callback
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = non_empty(params.code) else {
        return bad_request("Missing authorization code");
    };
    match state.auth.exchange_code(&code).await {
        Ok(tokens) => Json(TokenResponse::from(tokens)).into_response(),
        Err(e) => {
            warn!(error = %e, "OAuth code exchange failed");
            ApiError(e).into_response()
        }
    }
}

/// POST /auth/yahoo/refresh
pub async fn auth_refresh(State(state): State<AppState>, Json(body): Json<RefreshBody>) -> Response {
    let Some(refresh_token) = non_empty(body.refresh_token) else {
        return bad_request("Missing refresh token");
    };
    match state.auth.refresh(&refresh_token).await {
        Ok(tokens) => Json(TokenResponse::from(tokens)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
