//! Request correlation and admin authentication middleware.

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::OnceLock;
use subtle::ConstantTimeEq;

/// Correlation id attached to every request.
#[derive(Clone)]
pub struct RequestId(pub String);

/// Cached admin key from env. `None` = admin endpoints unguarded (dev mode).
static ADMIN_KEY: OnceLock<Option<String>> = OnceLock::new();

fn expected_admin_key() -> &'static Option<String> {
    ADMIN_KEY.get_or_init(|| {
        std::env::var("CINEVAULT_ADMIN_KEY")
            .ok()
            .filter(|k| !k.is_empty())
    })
}

/// Guard for `/api/admin/*`: validates `X-Api-Key` or `Authorization:
/// Bearer`. Constant-time comparison. This is UX-level gating on top of the
/// contract's own owner checks, not the security boundary.
pub async fn admin_key_auth(request: Request, next: Next) -> Response {
    let expected = match expected_admin_key() {
        Some(key) => key,
        None => return next.run(request).await,
    };

    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            request
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(str::to_string)
        });

    match provided {
        Some(ref key)
            if key.len() == expected.len() && key.as_bytes().ct_eq(expected.as_bytes()).into() =>
        {
            next.run(request).await
        }
        _ => {
            let body = serde_json::json!({
                "success": false,
                "error": "unauthorized: invalid or missing admin key"
            });
            (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
        }
    }
}

/// Propagate or generate `x-request-id`, and count the request.
pub async fn inject_request_id(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            format!("cv-{:016x}", rng.gen::<u64>())
        });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
