pub mod gemini;
pub mod github;
pub mod telegram;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use gemini::GeminiClient;
pub use github::GithubClient;
pub use telegram::TelegramClient;

/// Failure talking to one of the upstream APIs.
///
/// Transport and decode errors are stored without their URL, since Telegram
/// and Gemini carry credentials in the request URL.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{upstream} Error: {}", status_text(.status))]
    Status {
        upstream: &'static str,
        status: StatusCode,
    },
    #[error("{upstream} request failed: {source}")]
    Transport {
        upstream: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{upstream} base URL is invalid: {message}")]
    BaseUrl {
        upstream: &'static str,
        message: String,
    },
    #[error("{upstream} returned an unreadable response: {source}")]
    Decode {
        upstream: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Reason phrase for `status`, or the bare code if it has none.
fn status_text(status: &StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// Send `request` and fail on any non-2xx status.
pub(crate) async fn send(
    upstream: &'static str,
    request: RequestBuilder,
) -> Result<Response, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|e| UpstreamError::Transport {
            upstream,
            source: e.without_url(),
        })?;

    let status = response.status();
    debug!("{} responded with {}", upstream, status);
    if !status.is_success() {
        return Err(UpstreamError::Status { upstream, status });
    }
    Ok(response)
}

/// Decode the upstream body as JSON without interpreting it.
pub(crate) async fn json(upstream: &'static str, response: Response) -> Result<Value, UpstreamError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| UpstreamError::Decode {
            upstream,
            source: e.without_url(),
        })
}

/// Join `base` and `path` with exactly one slash between them.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_uses_reason_phrase() {
        let err = UpstreamError::Status {
            upstream: "GitHub",
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(err.to_string(), "GitHub Error: Not Found");
    }

    #[test]
    fn test_status_error_without_reason_phrase() {
        let err = UpstreamError::Status {
            upstream: "Gemini",
            status: StatusCode::from_u16(599).unwrap(),
        };
        assert_eq!(err.to_string(), "Gemini Error: 599");
    }

    #[test]
    fn test_endpoint_joins_single_slash() {
        assert_eq!(endpoint("https://api.github.com/", "/repos"), "https://api.github.com/repos");
        assert_eq!(endpoint("http://127.0.0.1:8080", "bot1:a/getMe"), "http://127.0.0.1:8080/bot1:a/getMe");
    }
}
