use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde_json::Value;

use crate::error::RelayError;
use crate::inference::InferenceClient;
use crate::model::ModelDescriptor;

/// Reply used when the slash command carried no text.
pub const EMPTY_MESSAGE_NOTICE: &str = "Please provide a message to rephrase.";

/// Rewrite style bound to each slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tone {
    Polite,
    Clarity,
    Simple,
}

impl Tone {
    pub fn label(self) -> &'static str {
        match self {
            Tone::Polite => "polite",
            Tone::Clarity => "clarity",
            Tone::Simple => "simple",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Builds the instruction sent to the model for one message.
pub fn build_prompt(tone: Tone, message: &str) -> String {
    format!(
        "Rephrase the following message to improve {tone}:\n\"{message}\". \
Strictly include only the following\n\
1. Rephrased message\n\
2. No additional text\n\
3. No formatting\n\
4. No markdown\n\
5. No code blocks\n\
Nothing other than the rephrased message should be included in the response. \
I want only the rephrased text very strictly. Don't include phrases like \
\"Here is the rephrased message\" or \"The rephrased message is\" or anything else. \
Just the rephrased text. No other text. No formatting. No markdown. No code blocks. \
Just the rephrased text. Nothing else.\n"
    )
}

/// Formats, invokes and extracts against the one configured model.
#[derive(Clone)]
pub struct Rephraser {
    model: &'static ModelDescriptor,
    client: Arc<dyn InferenceClient>,
}

impl Rephraser {
    pub fn new(model: &'static ModelDescriptor, client: Arc<dyn InferenceClient>) -> Self {
        Self { model, client }
    }

    pub fn model(&self) -> &'static ModelDescriptor {
        self.model
    }

    /// Rewrites `message` in the given tone. Blank messages short-circuit to
    /// [`EMPTY_MESSAGE_NOTICE`] without calling the model.
    pub async fn rephrase(&self, tone: Tone, message: &str) -> Result<String, RelayError> {
        if message.trim().is_empty() {
            return Ok(EMPTY_MESSAGE_NOTICE.to_owned());
        }

        let prompt = build_prompt(tone, message);
        let payload = serde_json::to_vec(&self.model.format_prompt(&prompt))
            .map_err(RelayError::EncodePayload)?;

        let raw = self.client.invoke(self.model.id, payload).await?;
        let body: Value = serde_json::from_slice(&raw).map_err(RelayError::DecodeResponse)?;

        Ok(self.model.extract_response(&body))
    }
}
