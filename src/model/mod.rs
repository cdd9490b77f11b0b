//! Static table of hosted models and their request/response shapes.

use serde_json::{json, Value};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const SYSTEM_PROMPT: &str = "You are a helpful assistant that rephrases text. \
Provide only the rephrased text with no additional commentary.";
const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.9;
const MAX_TOKENS: u32 = 1000;

/// Returned when a response body has none of the expected fields.
pub const EXTRACT_ERROR: &str = "Error: Could not extract response";

pub const DEFAULT_MODEL_SELECTOR: &str = "CLAUDE";

/// Supported model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Chat-style Anthropic model: system instruction plus a message list.
    Claude,
    /// Completion-style Llama model: a single templated prompt string.
    Llama,
}

/// One entry of the model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub selector: &'static str,
    pub id: &'static str,
    pub kind: ModelKind,
}

pub const MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        selector: "CLAUDE",
        id: "apac.anthropic.claude-3-5-sonnet-20240620-v1:0",
        kind: ModelKind::Claude,
    },
    ModelDescriptor {
        selector: "LLAMA",
        id: "meta.llama3-8b-instruct-v1:0",
        kind: ModelKind::Llama,
    },
];

impl ModelDescriptor {
    /// Looks up a model by selector (case-insensitive), falling back to the default.
    pub fn resolve(selector: &str) -> &'static ModelDescriptor {
        let selector = selector.trim();
        if let Some(model) = MODELS
            .iter()
            .find(|m| m.selector.eq_ignore_ascii_case(selector))
        {
            return model;
        }

        tracing::warn!(
            "unknown model selector `{selector}`; falling back to {DEFAULT_MODEL_SELECTOR}"
        );
        Self::default_model()
    }

    pub fn default_model() -> &'static ModelDescriptor {
        &MODELS[0]
    }

    /// Wraps an instruction into the vendor request body.
    pub fn format_prompt(&self, prompt: &str) -> Value {
        match self.kind {
            ModelKind::Claude => json!({
                "anthropic_version": ANTHROPIC_VERSION,
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
                "system": SYSTEM_PROMPT,
                "messages": [
                    {
                        "role": "user",
                        "content": [
                            {
                                "type": "text",
                                "text": prompt,
                            }
                        ]
                    }
                ],
            }),
            ModelKind::Llama => json!({
                "prompt": format!("\n\nHuman: {prompt}\n\nAssistant:"),
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
            }),
        }
    }

    /// Pulls plain text out of the vendor response body. Never fails; unknown
    /// shapes yield [`EXTRACT_ERROR`].
    pub fn extract_response(&self, body: &Value) -> String {
        let text = match self.kind {
            ModelKind::Claude => body
                .get("content")
                .and_then(Value::as_array)
                .and_then(|blocks| blocks.first())
                .and_then(|block| block.get("text"))
                .and_then(Value::as_str)
                .or_else(|| body.get("completion").and_then(Value::as_str)),
            ModelKind::Llama => body.get("generation").and_then(Value::as_str),
        };

        match text {
            Some(text) => text.trim().to_owned(),
            None => EXTRACT_ERROR.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(kind: ModelKind) -> &'static ModelDescriptor {
        MODELS.iter().find(|m| m.kind == kind).expect("model in table")
    }

    #[test]
    fn resolves_selectors_case_insensitively() {
        assert_eq!(ModelDescriptor::resolve("llama").kind, ModelKind::Llama);
        assert_eq!(ModelDescriptor::resolve(" CLAUDE ").kind, ModelKind::Claude);
    }

    #[test]
    fn unknown_selector_falls_back_to_claude() {
        let model = ModelDescriptor::resolve("gpt-9");
        assert_eq!(model.selector, DEFAULT_MODEL_SELECTOR);
        assert_eq!(model.id, "apac.anthropic.claude-3-5-sonnet-20240620-v1:0");
    }

    #[test]
    fn claude_payload_structure() {
        let payload = model(ModelKind::Claude).format_prompt("hi there");
        assert_eq!(payload["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(payload["max_tokens"], 1000);
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"][0]["type"], "text");
        assert_eq!(payload["messages"][0]["content"][0]["text"], "hi there");
        assert!(payload["system"].as_str().unwrap().contains("rephrases text"));
    }

    #[test]
    fn llama_payload_wraps_prompt() {
        let payload = model(ModelKind::Llama).format_prompt("hi there");
        assert_eq!(payload["prompt"], "\n\nHuman: hi there\n\nAssistant:");
        assert_eq!(payload["top_p"], 0.9);
        assert!(payload.get("messages").is_none());
    }

    #[test]
    fn claude_extracts_first_content_block() {
        let body = json!({
            "content": [{ "type": "text", "text": "  Could you help?  " }, { "text": "ignored" }]
        });
        assert_eq!(model(ModelKind::Claude).extract_response(&body), "Could you help?");
    }

    #[test]
    fn claude_falls_back_to_completion_field() {
        let body = json!({ "content": [], "completion": " done\n" });
        assert_eq!(model(ModelKind::Claude).extract_response(&body), "done");
    }

    #[test]
    fn llama_extracts_generation() {
        let body = json!({ "generation": "\nKindly review.", "stop_reason": "stop" });
        assert_eq!(model(ModelKind::Llama).extract_response(&body), "Kindly review.");
    }

    #[test]
    fn unknown_shapes_yield_sentinel() {
        let body = json!({ "unexpected": true });
        assert_eq!(model(ModelKind::Claude).extract_response(&body), EXTRACT_ERROR);
        assert_eq!(model(ModelKind::Llama).extract_response(&body), EXTRACT_ERROR);
        assert_eq!(
            model(ModelKind::Llama).extract_response(&json!({ "generation": 42 })),
            EXTRACT_ERROR
        );
    }
}
