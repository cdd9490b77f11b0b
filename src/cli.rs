use clap::Parser;
use reqwest::Url;

use crate::error::Result;
use crate::inference::BedrockConfig;
use crate::model::{self, ModelDescriptor};
use crate::oauth::{self, OAuthConfig};
use crate::rephrase::Tone;
use anyhow::Context as AnyhowContext;

/// Command-line options for the Slack rephrase relay.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Slack slash-command rephrasing relay", long_about = None)]
pub struct CliArgs {
    /// Host name or IP address to bind the HTTP server to.
    #[arg(long = "host", env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long = "port", env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Model selector (CLAUDE or LLAMA); unknown values fall back to CLAUDE.
    #[arg(long = "model", env = "DEFAULT_MODEL", default_value = model::DEFAULT_MODEL_SELECTOR)]
    pub model: String,

    /// AWS region hosting the Bedrock runtime.
    #[arg(long = "aws-region", env = "AWS_REGION", default_value = "ap-south-1")]
    pub aws_region: String,

    /// Static AWS access key id; the default credential chain is used when unset.
    #[arg(long = "aws-access-key-id", env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    /// Static AWS secret access key.
    #[arg(
        long = "aws-secret-access-key",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true
    )]
    pub aws_secret_access_key: Option<String>,

    /// Slack app client id used by the OAuth callback.
    #[arg(long = "slack-client-id", env = "SLACK_CLIENT_ID")]
    pub slack_client_id: Option<String>,

    /// Slack app client secret used by the OAuth callback.
    #[arg(long = "slack-client-secret", env = "SLACK_CLIENT_SECRET", hide_env_values = true)]
    pub slack_client_secret: Option<String>,

    /// Redirect URI registered with the Slack app.
    #[arg(long = "slack-redirect-uri", env = "SLACK_REDIRECT_URI")]
    pub slack_redirect_uri: Option<String>,

    /// Base URL of the Slack Web API.
    #[arg(long = "slack-api-base", env = "SLACK_API_BASE", default_value = oauth::DEFAULT_SLACK_API_BASE)]
    pub slack_api_base: String,

    /// Deployment environment; `production` hides internal error detail from Slack users.
    #[arg(long = "environment", env = "APP_ENV", default_value = "development")]
    pub environment: String,

    /// Rephrase a single message in this tone and exit instead of serving.
    #[arg(long = "tone", value_enum, requires = "text")]
    pub tone: Option<Tone>,

    /// Message for one-shot mode (requires `--tone`).
    #[arg(long = "text", requires = "tone")]
    pub text: Option<String>,
}

impl CliArgs {
    /// Host and port in the form accepted by `TcpListener::bind`, so host names resolve.
    pub fn listen_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    pub fn model(&self) -> &'static ModelDescriptor {
        ModelDescriptor::resolve(&self.model)
    }

    pub fn show_error_detail(&self) -> bool {
        !self.environment.trim().eq_ignore_ascii_case("production")
    }

    pub fn bedrock_config(&self) -> BedrockConfig {
        let config = BedrockConfig::new(self.aws_region.clone());
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(key), Some(secret)) => config.with_credentials(key.clone(), secret.clone()),
            _ => config,
        }
    }

    pub fn oauth_config(&self) -> Result<OAuthConfig> {
        let mut base = self.slack_api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base = Url::parse(&base)
            .with_context(|| format!("parsing Slack API base `{}`", self.slack_api_base))?;

        Ok(OAuthConfig {
            client_id: self.slack_client_id.clone(),
            client_secret: self.slack_client_secret.clone(),
            redirect_uri: self.slack_redirect_uri.clone(),
            api_base,
        })
    }
}
