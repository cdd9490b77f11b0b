use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_bedrockruntime::config::Region;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;

use crate::error::RelayError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// A single request/response call against a hosted model.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn invoke(&self, model_id: &str, payload: Vec<u8>) -> Result<Vec<u8>, RelayError>;
}

/// Region and optional static credentials for the Bedrock runtime.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl BedrockConfig {
    pub fn new(region: String) -> Self {
        Self {
            region,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    pub fn with_credentials(mut self, access_key_id: String, secret_access_key: String) -> Self {
        self.access_key_id = Some(access_key_id);
        self.secret_access_key = Some(secret_access_key);
        self
    }

    fn static_credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Some(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "slack-rephrase-relay",
            )),
            _ => None,
        }
    }
}

/// Bedrock `InvokeModel` client.
#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: Client,
}

impl BedrockClient {
    /// Builds the SDK client once; static credentials win over the default chain.
    pub async fn new(config: &BedrockConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        match config.static_credentials() {
            Some(credentials) => loader = loader.credentials_provider(credentials),
            None => tracing::info!("no static AWS credentials configured; using default chain"),
        }
        let sdk_config = loader.load().await;

        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl InferenceClient for BedrockClient {
    async fn invoke(&self, model_id: &str, payload: Vec<u8>) -> Result<Vec<u8>, RelayError> {
        tracing::debug!(model_id, payload_len = payload.len(), "invoking model");

        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type(JSON_CONTENT_TYPE)
            .accept(JSON_CONTENT_TYPE)
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(|err| RelayError::Inference(DisplayErrorContext(&err).to_string()))?;

        Ok(output.body.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credentials_require_both_halves() {
        let partial = BedrockConfig {
            region: "ap-south-1".into(),
            access_key_id: Some("AKIA".into()),
            secret_access_key: None,
        };
        assert!(partial.static_credentials().is_none());

        let full = BedrockConfig::new("ap-south-1".into())
            .with_credentials("AKIA".into(), "secret".into());
        let credentials = full.static_credentials().expect("static credentials");
        assert_eq!(credentials.access_key_id(), "AKIA");
        assert_eq!(credentials.secret_access_key(), "secret");
    }
}
