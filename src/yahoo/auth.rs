//! Yahoo OAuth 2.0 authorization-code flow.
//!
//! Token endpoint: `https://api.login.yahoo.com/oauth2/get_token`
//! Requests are form-encoded; the response carries `access_token`,
//! `refresh_token` and `expires_in`.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::RecapError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const AUTHORIZE_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";
const TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";
const PROVIDER: &str = "yahoo-oauth";

/// Token pair returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Supplies bearer credentials for the league-data provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Where to send the user to grant access.
    fn authorize_url(&self) -> Result<String, RecapError>;

    /// Trade an authorization code for a token pair.
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, RecapError>;

    /// Trade a refresh token for a new token pair. Fails with
    /// [`RecapError::Unauthorized`] when the refresh token is rejected.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, RecapError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct YahooAuth {
    http: Client,
    client_id: Option<String>,
    client_secret: Option<Secret<String>>,
    redirect_uri: String,
    authorize_endpoint: String,
    token_endpoint: String,
}

impl YahooAuth {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<Secret<String>>,
        redirect_uri: String,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            http,
            client_id: client_id.filter(|id| !id.is_empty()),
            client_secret,
            redirect_uri,
            authorize_endpoint: AUTHORIZE_URL.to_string(),
            token_endpoint: TOKEN_URL.to_string(),
        })
    }

    /// Point token requests at a different endpoint.
    pub fn with_token_endpoint(mut self, url: impl Into<String>) -> Self {
        self.token_endpoint = url.into();
        self
    }

    fn credentials(&self) -> Result<(&str, &str), RecapError> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !secret.expose_secret().is_empty() => {
                Ok((id.as_str(), secret.expose_secret().as_str()))
            }
            _ => Err(RecapError::MissingCredential),
        }
    }

    async fn request_token(&self, grant: &[(&str, &str)]) -> Result<TokenSet, RecapError> {
        let (client_id, client_secret) = self.credentials()?;

        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        form.extend_from_slice(grant);

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| RecapError::Upstream {
                provider: PROVIDER.into(),
                message: format!("Request error: {e}"),
            })?;

        let status = response.status();
        if status.as_u16() == 400 || status.as_u16() == 401 {
            warn!(status = %status, "Token endpoint rejected the grant");
            return Err(RecapError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecapError::Upstream {
                provider: PROVIDER.into(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        response.json::<TokenSet>().await.map_err(|e| RecapError::Upstream {
            provider: PROVIDER.into(),
            message: format!("Failed to parse token response: {e}"),
        })
    }
}

#[async_trait]
impl AuthProvider for YahooAuth {
    fn authorize_url(&self) -> Result<String, RecapError> {
        let client_id = self.client_id.as_deref().ok_or(RecapError::MissingCredential)?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code",
            self.authorize_endpoint,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.redirect_uri),
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, RecapError> {
        debug!("Exchanging authorization code");
        let tokens = self
            .request_token(&[("code", code), ("grant_type", "authorization_code")])
            .await?;
        info!(expires_in = tokens.expires_in, "Authorization code exchanged");
        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, RecapError> {
        debug!("Refreshing access token");
        let tokens = self
            .request_token(&[
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;
        info!(expires_in = tokens.expires_in, "Access token refreshed");
        Ok(tokens)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
