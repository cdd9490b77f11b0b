use thiserror::Error;

/// Result alias used by the binary's top-level flow.
pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Failures raised while serving a Slack request.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("inference request failed: {0}")]
    Inference(String),

    #[error("failed to encode model payload: {0}")]
    EncodePayload(#[source] serde_json::Error),

    #[error("model returned a non-JSON body: {0}")]
    DecodeResponse(#[source] serde_json::Error),

    #[error("invalid slash command payload: {0}")]
    InvalidPayload(String),
}

/// Failures while exchanging an OAuth code with Slack.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Slack OAuth is not configured")]
    NotConfigured,

    #[error("invalid Slack API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Slack OAuth request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
