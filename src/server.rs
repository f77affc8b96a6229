use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::gateway::{Gateway, Reply};

/// Route the frontend posts to.
pub const PROXY_PATH: &str = "/api/proxy";

const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
    Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// Build the router. Every response, including rejections from extractors,
/// goes out with the permissive CORS headers.
pub fn router(gateway: Arc<Gateway>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(PROXY_PATH, any(proxy))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::map_response(with_cors))
        .with_state(gateway)
}

async fn proxy(State(gateway): State<Arc<Gateway>>, method: Method, body: Bytes) -> Response {
    let span = tracing::info_span!("proxy", request_id = %Uuid::new_v4(), %method);
    gateway.handle(&method, &body).instrument(span).await.into_response()
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

async fn with_cors(mut response: Response) -> Response {
    apply_cors(response.headers_mut());
    response
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,OPTIONS,PATCH,DELETE,POST,PUT"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}
