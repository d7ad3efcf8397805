//! Response types for the gateway API.

use crate::contract::TxStatus;
use crate::gating::PlayerState;
use crate::types::{Amount, Meme, Movie, Rental, UserProfile};
use serde::Serialize;

/// Response from the health endpoint.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub contract_address: String,
    pub uptime_secs: u64,
    pub requests: u64,
    pub active_bridge: String,
    pub failovers: u64,
    pub relay_configured: bool,
}

/// Response from a write endpoint: the submitted transaction handle.
#[derive(Serialize)]
pub struct TxResponse {
    pub success: bool,
    pub tx_hash: String,
    pub status: TxStatus,
}

impl TxResponse {
    pub fn submitted(tx_hash: String) -> Self {
        Self {
            success: true,
            tx_hash,
            status: TxStatus::Pending,
        }
    }
}

/// A movie with its preview content resolved to gateway URLs.
#[derive(Serialize)]
pub struct MovieView {
    #[serde(flatten)]
    pub movie: Movie,
    pub trailer_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// A rental cost quote, discount evaluated at request time.
#[derive(Serialize)]
pub struct QuoteResponse {
    pub movie_id: u64,
    pub duration: String,
    pub days: u64,
    pub base_cost: Amount,
    pub discount_applied: bool,
    pub final_cost: Amount,
    /// Informational 90/10 split; the contract enforces the real one.
    pub owner_share: Amount,
    pub platform_share: Amount,
}

/// Gating state for a (viewer, movie) pair.
#[derive(Serialize)]
pub struct AccessResponse {
    pub movie_id: u64,
    pub state: PlayerState,
    pub trailer_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Present only once playback was explicitly requested and granted.
    pub film_url: Option<String>,
}

/// One rental joined with its movie, plus the activity flag.
#[derive(Serialize)]
pub struct RentalView {
    #[serde(flatten)]
    pub rental: Rental,
    pub active: bool,
    pub movie: Option<Movie>,
}

/// Owner dashboard aggregates for the profile page.
#[derive(Serialize)]
pub struct OwnerDashboard {
    pub profile: UserProfile,
    pub movies: Vec<Movie>,
    pub total_rentals: u64,
    /// 48h-price basis, owner's 90% share.
    pub approx_earnings: Amount,
}

#[derive(Serialize)]
pub struct FeesResponse {
    pub upload_fee: Amount,
    pub meme_fee: Amount,
}

/// A meme with its image resolved to a gateway URL.
#[derive(Serialize)]
pub struct MemeView {
    #[serde(flatten)]
    pub meme: Meme,
    pub image_url: Option<String>,
}

/// Current spotlight meme with its image resolved.
#[derive(Serialize)]
pub struct SpotlightResponse {
    pub meme: Option<Meme>,
    pub image_url: Option<String>,
}

/// Advisory admin view of the spotlight trigger.
#[derive(Serialize)]
pub struct SpotlightStatusResponse {
    /// Detected via `platformOwner()` then `owner()`; non-authoritative.
    pub owner: Option<String>,
    pub caller_is_owner: Option<bool>,
    pub last_spotlight_timestamp: u64,
    pub available: bool,
    pub spotlight: Option<Meme>,
}

/// Upload price projections for the upload form. Informational only; just
/// the derived per-day price is ever submitted.
#[derive(Serialize)]
pub struct PriceProjection {
    pub price_48h: Amount,
    pub price_per_day: Amount,
    pub projected_72h: Amount,
    pub projected_1w: Amount,
}
