//! Slack slash-command payloads and ephemeral replies.

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

pub const COMMAND_NOT_FOUND: &str =
    "Command not found. Available commands: /polite, /clarity, /simple";

/// Fields Slack posts for a slash command. Only `text` affects the reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SlashCommand {
    pub command: Option<String>,
    pub text: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub channel_id: Option<String>,
    pub team_id: Option<String>,
    pub response_url: Option<String>,
}

impl SlashCommand {
    /// Decodes a request body: JSON when declared as such, otherwise
    /// `application/x-www-form-urlencoded` as Slack sends it.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, RelayError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let is_json = content_type
            .map(|value| value.trim().to_ascii_lowercase())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            serde_json::from_slice(body)
                .map_err(|err| RelayError::InvalidPayload(format!("malformed JSON body: {err}")))
        } else {
            Ok(Self::from_form(body))
        }
    }

    fn from_form(body: &[u8]) -> Self {
        let mut command = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let slot = match &*key {
                "command" => &mut command.command,
                "text" => &mut command.text,
                "user_id" => &mut command.user_id,
                "user_name" => &mut command.user_name,
                "channel_id" => &mut command.channel_id,
                "team_id" => &mut command.team_id,
                "response_url" => &mut command.response_url,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        command
    }

    pub fn message(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Reply body shown only to the user who ran the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralReply {
    pub response_type: String,
    pub text: String,
}

impl EphemeralReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            response_type: "ephemeral".to_owned(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_slack_form_body() {
        let body = b"token=x&team_id=T1&channel_id=C9&user_id=U2&user_name=ana\
&command=%2Fpolite&text=send+me+the+file%21&response_url=https%3A%2F%2Fhooks.slack.com%2Fx";
        let command = SlashCommand::parse(Some("application/x-www-form-urlencoded"), body).unwrap();

        assert_eq!(command.command.as_deref(), Some("/polite"));
        assert_eq!(command.message(), "send me the file!");
        assert_eq!(command.team_id.as_deref(), Some("T1"));
        assert_eq!(command.user_id.as_deref(), Some("U2"));
        assert_eq!(command.user_name.as_deref(), Some("ana"));
        assert_eq!(
            command.response_url.as_deref(),
            Some("https://hooks.slack.com/x")
        );
    }

    #[test]
    fn parses_json_body() {
        let body = br#"{"text":"fix it","user_id":"U1","user_name":"bo","extra":1}"#;
        let command = SlashCommand::parse(Some("application/json; charset=utf-8"), body).unwrap();
        assert_eq!(command.message(), "fix it");
        assert_eq!(command.user_id.as_deref(), Some("U1"));
        assert_eq!(command.user_name.as_deref(), Some("bo"));
    }

    #[test]
    fn empty_body_has_no_message() {
        let command = SlashCommand::parse(None, b"").unwrap();
        assert_eq!(command, SlashCommand::default());
        assert_eq!(command.message(), "");
    }

    #[test]
    fn form_without_text_has_no_message() {
        let command = SlashCommand::parse(None, b"user_id=U1").unwrap();
        assert!(command.text.is_none());
        assert_eq!(command.message(), "");
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = SlashCommand::parse(Some("application/json"), b"{not json").unwrap_err();
        assert_matches!(err, RelayError::InvalidPayload(_));
    }

    #[test]
    fn ephemeral_reply_serializes() {
        let value = serde_json::to_value(EphemeralReply::new("hi")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "response_type": "ephemeral", "text": "hi" })
        );
    }
}
