use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{endpoint, json, send, UpstreamError};
use crate::action::GeminiChat;
use crate::config::GeminiConfig;

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
}

impl<'a> GenerateContentRequest<'a> {
    /// A single user turn under the configured persona.
    fn single_turn(prompt: &'a str, system_instruction: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: system_instruction,
                }],
            },
        }
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    /// Returns the raw `generateContent` response; candidates are not unwrapped.
    pub async fn generate(&self, chat: &GeminiChat) -> Result<Value, UpstreamError> {
        let url = endpoint(
            &self.config.api_url,
            &format!("v1beta/models/{}:generateContent", self.config.model),
        );
        debug!("Sending prompt to Gemini model {}", self.config.model);

        let body = GenerateContentRequest::single_turn(&chat.prompt, &self.config.system_instruction);
        let request = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body);

        let response = send("Gemini", request).await?;
        json("Gemini", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let body = GenerateContentRequest::single_turn("halo", "persona");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{"parts": [{"text": "halo"}]}],
                "systemInstruction": {"parts": [{"text": "persona"}]}
            })
        );
    }
}
