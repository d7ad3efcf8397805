//! Error types for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Gateway error type.
#[derive(Debug)]
pub enum Error {
    /// Local pre-flight validation failure. Never reaches the network.
    Validation(String),
    /// Requested entity does not exist (sentinel id, unparseable id).
    NotFound(String),
    /// Configuration / operator error (missing credential, bad address).
    Config(String),
    /// Chain bridge communication error (unreachable, bad response shape).
    Rpc(String),
    /// Error reported by the contract itself through the bridge, e.g. a
    /// reverted view call. Deterministic, so never retried.
    Contract(String),
    /// Non-success response from the pinning provider, forwarded as-is.
    Relay { status: u16, body: String },
    /// Transaction failure, already translated to a short message.
    Tx(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "validation error: {msg}"),
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Rpc(msg) => write!(f, "rpc error: {msg}"),
            Error::Contract(msg) => write!(f, "contract error: {msg}"),
            Error::Relay { status, body } => write!(f, "relay error ({status}): {body}"),
            Error::Tx(msg) => write!(f, "transaction failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            // Provider failures pass through untouched so callers see the
            // exact upstream status and body.
            Error::Relay { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                return (status, body).into_response();
            }
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Rpc(_) => StatusCode::BAD_GATEWAY,
            Error::Contract(_) => StatusCode::BAD_REQUEST,
            Error::Tx(_) => StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string()
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::Validation("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Config("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Rpc("x".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Contract("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_relay_error_forwards_provider_status_and_body() {
        let err = Error::Relay {
            status: 429,
            body: "rate limited".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        // The upstream body is not rewrapped in the gateway error envelope.
        assert_eq!(&bytes[..], b"rate limited");
    }
}
