//! Axum HTTP surface.
//!
//! Serves the league/scoreboard proxy, the recap endpoint and the OAuth
//! flow. CORS is open so a browser front-end on another origin can call it.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use routes::{AppState, ServerState};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/api/leagues", get(routes::get_leagues))
        .route("/api/scoreboard", get(routes::get_scoreboard))
        .route("/api/summary", post(routes::post_summary))
        // OAuth
        .route("/auth/yahoo", get(routes::auth_redirect))
        .route("/auth/yahoo/callback", get(routes::auth_callback))
        .route("/auth/yahoo/refresh", post(routes::auth_refresh))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(addr, "Recap server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received.");
        })
        .await
        .context("Server error")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
