use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::gateway::Reply;
use crate::upstream::UpstreamError;

/// Every way a proxy request can end without a successful relay.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Server misconfiguration")]
    Misconfigured,
    #[error("Akses Ditolak: Kode Akses Salah atau Tidak Ada")]
    AccessDenied,
    #[error("Unknown action")]
    UnknownAction,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("{0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AccessDenied => StatusCode::UNAUTHORIZED,
            Self::UnknownAction => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::InvalidPayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_reply(self) -> Reply {
        Reply::json(self.status(), json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(GatewayError::Misconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(GatewayError::AccessDenied.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::UnknownAction.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_error_reply_carries_message() {
        let err = GatewayError::from(UpstreamError::Status {
            upstream: "GitHub Delete",
            status: StatusCode::CONFLICT,
        });
        let reply = err.into_reply();
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            reply.body,
            Some(json!({"error": "GitHub Delete Error: Conflict"}))
        );
    }
}
