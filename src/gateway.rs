use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::action::{Action, ActionKind, InboundRequest};
use crate::config::Config;
use crate::error::GatewayError;
use crate::report::Reporter;
use crate::upstream::{GeminiClient, GithubClient, TelegramClient};

/// Status and optional JSON body, before HTTP encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }
}

/// Validates the access code and relays one action to its upstream.
/// Holds no per-request state; share it behind an `Arc`.
pub struct Gateway {
    access_code: Option<String>,
    github: GithubClient,
    telegram: TelegramClient,
    gemini: GeminiClient,
    reporter: Arc<dyn Reporter>,
}

impl Gateway {
    pub fn new(config: &Config, reporter: Arc<dyn Reporter>) -> Self {
        let client = reqwest::Client::new();
        Self {
            access_code: config.access_code().map(str::to_string),
            github: GithubClient::new(client.clone(), config.github.clone()),
            telegram: TelegramClient::new(client.clone(), config.telegram.clone()),
            gemini: GeminiClient::new(client, config.gemini.clone()),
            reporter,
        }
    }

    pub async fn handle(&self, method: &Method, body: &[u8]) -> Reply {
        if method == Method::OPTIONS {
            return Reply::empty(StatusCode::OK);
        }

        match self.process(method, body).await {
            Ok(body) => Reply::json(StatusCode::OK, body),
            Err(e) => e.into_reply(),
        }
    }

    async fn process(&self, method: &Method, body: &[u8]) -> Result<Value, GatewayError> {
        if method != Method::POST {
            return Err(GatewayError::MethodNotAllowed);
        }

        let Some(expected) = self.access_code.as_deref() else {
            self.reporter
                .misconfigured("ACCESS_CODE environment variable not set.");
            return Err(GatewayError::Misconfigured);
        };

        let request = InboundRequest::parse(body);
        if !request.access_code().is_some_and(|code| codes_match(code, expected)) {
            self.reporter.access_denied();
            return Err(GatewayError::AccessDenied);
        }

        let kind = request
            .action_name()
            .and_then(ActionKind::parse)
            .ok_or(GatewayError::UnknownAction)?;

        let result = match Action::decode(kind, request.into_payload()) {
            Ok(action) => self.dispatch(action).await,
            Err(e) => Err(GatewayError::InvalidPayload(e)),
        };

        if let Err(ref e) = result {
            self.reporter.dispatch_failed(kind.as_str(), &e.to_string());
        }
        result
    }

    async fn dispatch(&self, action: Action) -> Result<Value, GatewayError> {
        info!("Relaying {}", action.kind());

        let body = match action {
            Action::GithubFetch(file) => self.github.fetch(&file).await?,
            Action::GithubUpload(upload) => self.github.upload(&upload).await?,
            Action::GithubDelete(delete) => {
                self.github.delete(&delete).await?;
                success()
            }
            Action::TelegramSend(message) => {
                self.telegram.send_message(&message).await?;
                success()
            }
            Action::TelegramGetUpdates(updates) => self.telegram.get_updates(&updates).await?,
            Action::GeminiChat(chat) => self.gemini.generate(&chat).await?,
        };

        debug!("Relay complete");
        Ok(body)
    }
}

/// Compare in constant time for equal lengths; a length mismatch fails fast.
fn codes_match(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn success() -> Value {
    json!({ "success": true })
}
