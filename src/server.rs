use std::sync::Arc;

use anyhow::Context as AnyhowContext;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    cli::CliArgs,
    error::{OAuthError, RelayError, Result},
    inference::BedrockClient,
    oauth::{OAuthClient, OAuthOutcome, INSTALL_SUCCESS},
    rephrase::{Rephraser, Tone},
    slack::{EphemeralReply, SlashCommand, COMMAND_NOT_FOUND},
};

const GENERIC_ERROR: &str = "Sorry, something went wrong. Please try again later.";

#[derive(Clone)]
pub struct ServerState {
    rephraser: Rephraser,
    oauth: Arc<OAuthClient>,
    show_error_detail: bool,
}

impl ServerState {
    pub fn new(rephraser: Rephraser, oauth: OAuthClient, show_error_detail: bool) -> Self {
        Self {
            rephraser,
            oauth: Arc::new(oauth),
            show_error_detail,
        }
    }
}

pub async fn run_relay_server(args: &CliArgs) -> Result<()> {
    let model = args.model();

    let client = BedrockClient::new(&args.bedrock_config()).await;
    let rephraser = Rephraser::new(model, Arc::new(client));
    let oauth = OAuthClient::new(args.oauth_config()?).context("building Slack OAuth client")?;
    if !oauth.is_configured() {
        tracing::info!("Slack OAuth credentials not set; /slack/oauth/callback is disabled");
    }

    let state = ServerState::new(rephraser, oauth, args.show_error_detail());

    let (host, port) = args.listen_addr();
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("binding relay server address `{host}:{port}`"))?;
    let local_addr = listener
        .local_addr()
        .context("reading relay server address")?;
    tracing::info!(model = model.id, "Slack app listening on http://{local_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::warn!("failed to listen for shutdown signal: {err:?}");
            }
            tracing::info!("Shutdown signal received; stopping server");
        })
        .await
        .context("running relay server")?;

    Ok(())
}

/// Every path and method outside the known routes answers with the
/// command-not-found reply.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(command_not_found))
        .route("/polite", post(polite).fallback(command_not_found))
        .route("/clarity", post(clarity).fallback(command_not_found))
        .route("/simple", post(simple).fallback(command_not_found))
        .route(
            "/slack/oauth/callback",
            get(oauth_callback).fallback(command_not_found),
        )
        .fallback(command_not_found)
        .with_state(state)
}

/// Slash-command failure rendered as a 200 ephemeral reply so Slack still
/// shows it to the invoking user.
struct ApiError {
    detail: String,
    show_detail: bool,
}

impl ApiError {
    fn new(state: &ServerState, err: RelayError) -> Self {
        tracing::error!("rephrase failed: {err}");
        Self {
            detail: err.to_string(),
            show_detail: state.show_error_detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let text = if self.show_detail {
            format!("Error: {}", self.detail)
        } else {
            GENERIC_ERROR.to_owned()
        };
        (StatusCode::OK, Json(EphemeralReply::new(text))).into_response()
    }
}

async fn health(State(state): State<ServerState>) -> Response {
    Json(json!({
        "status": "ok",
        "model": state.rephraser.model().id,
    }))
    .into_response()
}

async fn command_not_found() -> Response {
    (StatusCode::OK, Json(EphemeralReply::new(COMMAND_NOT_FOUND))).into_response()
}

/// Body extraction result; oversized or unreadable bodies still get an ephemeral reply.
type SlashBody = std::result::Result<Bytes, BytesRejection>;

async fn polite(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: SlashBody,
) -> Response {
    slash_command(&state, Tone::Polite, &headers, body).await
}

async fn clarity(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: SlashBody,
) -> Response {
    slash_command(&state, Tone::Clarity, &headers, body).await
}

async fn simple(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: SlashBody,
) -> Response {
    slash_command(&state, Tone::Simple, &headers, body).await
}

async fn slash_command(
    state: &ServerState,
    tone: Tone,
    headers: &HeaderMap,
    body: SlashBody,
) -> Response {
    let span = tracing::info_span!("slash_command", request_id = %Uuid::new_v4(), %tone);

    async move {
        let body = match body {
            Ok(body) => body,
            Err(rejection) => {
                let err = RelayError::InvalidPayload(rejection.body_text());
                return ApiError::new(state, err).into_response();
            }
        };
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());

        let command = match SlashCommand::parse(content_type, &body) {
            Ok(command) => command,
            Err(err) => return ApiError::new(state, err).into_response(),
        };
        tracing::info!(
            command = command.command.as_deref().unwrap_or("-"),
            team = command.team_id.as_deref().unwrap_or("-"),
            user = command.user_id.as_deref().unwrap_or("-"),
            user_name = command.user_name.as_deref().unwrap_or("-"),
            channel = command.channel_id.as_deref().unwrap_or("-"),
            "received slash command"
        );
        tracing::debug!(
            response_url = command.response_url.as_deref().unwrap_or("-"),
            "slash command response url"
        );

        match state.rephraser.rephrase(tone, command.message()).await {
            Ok(text) => Json(EphemeralReply::new(text)).into_response(),
            Err(err) => ApiError::new(state, err).into_response(),
        }
    }
    .instrument(span)
    .await
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

async fn oauth_callback(
    State(state): State<ServerState>,
    params: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::warn!("invalid OAuth callback query: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                "Slack authorization failed: invalid callback parameters",
            )
                .into_response();
        }
    };

    if let Some(error) = params.error {
        tracing::warn!("Slack OAuth authorization declined: {error}");
        return (
            StatusCode::BAD_REQUEST,
            format!("Slack authorization failed: {error}"),
        )
            .into_response();
    }

    let Some(code) = params.code.filter(|code| !code.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing authorization code").into_response();
    };

    match state.oauth.exchange_code(&code).await {
        Ok(OAuthOutcome::Installed { .. }) => (StatusCode::OK, INSTALL_SUCCESS).into_response(),
        Ok(OAuthOutcome::Rejected(error)) => (
            StatusCode::BAD_REQUEST,
            format!("Slack OAuth failed: {error}"),
        )
            .into_response(),
        Err(OAuthError::NotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            OAuthError::NotConfigured.to_string(),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Slack OAuth exchange failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Slack OAuth exchange failed. Please try again later.",
            )
                .into_response()
        }
    }
}
