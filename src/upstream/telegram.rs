use serde::Serialize;
use serde_json::Value;

use super::{endpoint, json, send, UpstreamError};
use crate::action::{ChatId, TelegramSend, TelegramUpdates};
use crate::config::TelegramConfig;

/// Page size for `getUpdates`.
const UPDATES_LIMIT: u32 = 5;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
}

/// Client for the Bot API. The bot token is part of every URL, so URLs are never logged.
pub struct TelegramClient {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        endpoint(
            &self.config.api_url,
            &format!("bot{}/{}", self.config.bot_token, method),
        )
    }

    /// Send a text message. The Bot API's reply is discarded.
    pub async fn send_message(&self, message: &TelegramSend) -> Result<(), UpstreamError> {
        let body = SendMessageRequest {
            chat_id: &message.chat_id,
            text: &message.text,
        };
        let request = self.client.post(self.method_url("sendMessage")).json(&body);
        send("Telegram Send", request).await?;
        Ok(())
    }

    pub async fn get_updates(&self, updates: &TelegramUpdates) -> Result<Value, UpstreamError> {
        let mut query: Vec<(&str, String)> = Vec::with_capacity(2);
        if let Some(offset) = updates.offset {
            query.push(("offset", offset.to_string()));
        }
        query.push(("limit", UPDATES_LIMIT.to_string()));

        let request = self.client.get(self.method_url("getUpdates")).query(&query);
        let response = send("Telegram Updates", request).await?;
        json("Telegram Updates", response).await
    }
}
