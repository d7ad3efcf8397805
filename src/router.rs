//! HTTP router setup.

use crate::state::AppState;
use crate::{handlers, middleware as mw, relay};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Per-request timeout. Generous because relay uploads can carry a full
/// film; transaction confirmation is polled, never awaited in-request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/fees", post(handlers::set_fees))
        .route("/withdraw", post(handlers::withdraw_balance))
        .route("/spotlight", post(handlers::trigger_spotlight))
        .route("/spotlight/status", get(handlers::spotlight_status))
        .layer(middleware::from_fn(mw::admin_key_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/pinata/upload-file", post(relay::upload_file))
        .route("/api/pinata/upload-json", post(relay::upload_json))
        .route("/api/movies", get(handlers::list_movies).post(handlers::upload_movie))
        .route("/api/movies/{id}", get(handlers::get_movie))
        .route("/api/movies/{id}/quote", get(handlers::quote))
        .route("/api/movies/{id}/access", get(handlers::access))
        .route("/api/movies/{id}/rent", post(handlers::rent_movie))
        .route("/api/upload/price-preview", get(handlers::price_preview))
        .route("/api/profile", post(handlers::create_profile))
        .route("/api/profile/{address}", get(handlers::get_profile))
        .route("/api/profile/{address}/movies", get(handlers::owner_dashboard))
        .route("/api/rentals/{address}", get(handlers::rentals))
        .route("/api/memes", post(handlers::mint_meme))
        .route("/api/memes/{address}", get(handlers::user_memes))
        .route("/api/fees", get(handlers::fees))
        .route("/api/spotlight", get(handlers::spotlight))
        .route("/api/tx/{tx_hash}", get(handlers::tx_status))
        .nest("/api/admin", admin)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            mw::inject_request_id,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
        .with_state(state)
}
