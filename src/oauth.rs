//! Slack OAuth v2 installation handshake.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Url};
use serde::Deserialize;

use crate::error::OAuthError;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api/";
pub const INSTALL_SUCCESS: &str = "Slack app installed successfully! You can close this window.";

/// App credentials used for the code exchange.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub api_base: Url,
}

impl OAuthConfig {
    fn credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }
}

/// Result of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthOutcome {
    Installed { team: Option<String> },
    /// Slack answered `ok: false`; carries its error code.
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    team: Option<TeamInfo>,
}

#[derive(Debug, Deserialize)]
struct TeamInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: Client,
    config: OAuthConfig,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Trades an authorization code for an install token via `oauth.v2.access`.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthOutcome, OAuthError> {
        let (client_id, client_secret) =
            self.config.credentials().ok_or(OAuthError::NotConfigured)?;
        let url = self.config.api_base.join("oauth.v2.access")?;

        let mut form = vec![
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
        ];
        if let Some(redirect_uri) = self.config.redirect_uri.as_deref() {
            form.push(("redirect_uri", redirect_uri));
        }

        let response: AccessResponse = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if response.ok {
            let team = response.team.and_then(|team| team.name);
            tracing::info!(team = team.as_deref().unwrap_or("unknown"), "Slack app installed");
            Ok(OAuthOutcome::Installed { team })
        } else {
            let error = response.error.unwrap_or_else(|| "unknown_error".to_owned());
            tracing::warn!("Slack rejected OAuth exchange: {error}");
            Ok(OAuthOutcome::Rejected(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn config(base: &str) -> OAuthConfig {
        OAuthConfig {
            client_id: Some("123.456".into()),
            client_secret: Some("shh".into()),
            redirect_uri: Some("https://relay.example/slack/oauth/callback".into()),
            api_base: Url::parse(base).unwrap(),
        }
    }

    #[tokio::test]
    async fn successful_exchange_reports_team() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/oauth.v2.access")
                    .body_contains("client_id=123.456")
                    .body_contains("client_secret=shh")
                    .body_contains("code=abc")
                    .body_contains("redirect_uri=https%3A%2F%2Frelay.example");
                then.status(200).json_body(json!({
                    "ok": true,
                    "access_token": "xoxb-1",
                    "team": { "id": "T1", "name": "Acme" }
                }));
            })
            .await;

        let client = OAuthClient::new(config(&server.url("/api/"))).unwrap();
        let outcome = client.exchange_code("abc").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            outcome,
            OAuthOutcome::Installed {
                team: Some("Acme".into())
            }
        );
    }

    #[tokio::test]
    async fn provider_error_is_returned() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/oauth.v2.access");
                then.status(200)
                    .json_body(json!({ "ok": false, "error": "invalid_code" }));
            })
            .await;

        let client = OAuthClient::new(config(&server.url("/api/"))).unwrap();
        let outcome = client.exchange_code("stale").await.unwrap();
        assert_eq!(outcome, OAuthOutcome::Rejected("invalid_code".into()));
    }

    #[tokio::test]
    async fn unreadable_response_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/oauth.v2.access");
                then.status(502).body("bad gateway");
            })
            .await;

        let client = OAuthClient::new(config(&server.url("/api/"))).unwrap();
        let err = client.exchange_code("abc").await.unwrap_err();
        assert_matches!(err, OAuthError::Transport(_));
    }

    #[tokio::test]
    async fn missing_credentials_short_circuit() {
        let mut config = config(DEFAULT_SLACK_API_BASE);
        config.client_secret = None;

        let client = OAuthClient::new(config).unwrap();
        assert!(!client.is_configured());
        assert_matches!(
            client.exchange_code("abc").await,
            Err(OAuthError::NotConfigured)
        );
    }
}
