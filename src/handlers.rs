//! HTTP request handlers for the contract-facing API.

use crate::contract::{spotlight_available, TxStatus};
use crate::error::Error;
use crate::gating::PlayerState;
use crate::pricing;
use crate::response::{
    AccessResponse, FeesResponse, HealthResponse, MemeView, MovieView, OwnerDashboard,
    PriceProjection, QuoteResponse, RentalView, SpotlightResponse, SpotlightStatusResponse,
    TxResponse,
};
use crate::state::AppState;
use crate::submission::{gate_meme_submission, gate_movie_submission};
use crate::types::{Amount, MoviePage, Movie, UserProfile};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

/// Health check with basic metrics.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        contract_address: state.config.contract_address.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
        active_bridge: state.rpc.active_url().to_string(),
        failovers: state.rpc.failover_count(),
        relay_configured: state.pinata_jwt.is_some(),
    })
}

// --- Movie reads ---

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub cursor: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
}

fn default_page_size() -> u64 {
    20
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<MoviePage>, Error> {
    let size = page.size.min(1000);
    let page = state.contract().paginated_movies(page.cursor, size).await?;
    Ok(Json(page))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MovieView>, Error> {
    let movie = lookup_movie(&state, &id).await?;
    let trailer_url = cid_url(&state, &movie.trailer_cid);
    let thumbnail_url = cid_url(&state, &movie.thumbnail_cid);
    Ok(Json(MovieView {
        movie,
        trailer_url,
        thumbnail_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub duration: String,
    pub renter: Option<String>,
}

/// Rental cost quote. Discount eligibility is read fresh here, and again at
/// rent time, never cached in between.
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<QuoteResponse>, Error> {
    let movie = lookup_movie(&state, &id).await?;
    let bucket = pricing::DurationBucket::parse(&query.duration)?;

    let profile = match query.renter.as_deref() {
        Some(renter) => {
            pricing::check_self_rental(renter, &movie)?;
            Some(state.contract().user_profile(renter).await?)
        }
        None => None,
    };

    Ok(Json(build_quote(&movie, bucket, profile.as_ref(), now_secs())))
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub address: String,
    /// Explicit "watch now" request; full playback is never implicit.
    #[serde(default)]
    pub watch: bool,
}

/// Gating state for a (viewer, movie) pair.
pub async fn access(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessResponse>, Error> {
    let movie = lookup_movie(&state, &id).await?;
    let has_rental = state
        .contract()
        .has_active_rental(&query.address, movie.id)
        .await?;

    let mut player = PlayerState::from_rental(has_rental);
    if query.watch {
        player = player.watch_now(&movie.film_cid)?;
    }

    let film_url = if player == PlayerState::PlayingFullMovie {
        cid_url(&state, &movie.film_cid)
    } else {
        None
    };
    Ok(Json(AccessResponse {
        movie_id: movie.id,
        state: player,
        trailer_url: cid_url(&state, &movie.trailer_cid),
        thumbnail_url: cid_url(&state, &movie.thumbnail_cid),
        film_url,
    }))
}

// --- Profile & rentals ---

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<UserProfile>, Error> {
    let profile = state.contract().user_profile(&address).await?;
    Ok(Json(profile))
}

pub async fn rentals(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Vec<RentalView>>, Error> {
    let contract = state.contract();
    let rentals = contract.user_rentals(&address).await?;
    let now = now_secs();

    let mut views = Vec::with_capacity(rentals.len());
    for rental in rentals {
        let movie = contract.movie(rental.movie_id).await?;
        let active = rental.is_active(now);
        views.push(RentalView {
            rental,
            active,
            movie,
        });
    }
    Ok(Json(views))
}

/// Owner dashboard: the user's movies with rental/earnings aggregates.
pub async fn owner_dashboard(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<OwnerDashboard>, Error> {
    const PAGE_SIZE: u64 = 500;

    let contract = state.contract();
    let profile = contract.user_profile(&address).await?;

    // Walk the whole catalog; a single page would under-count large ones.
    let mut movies: Vec<Movie> = Vec::new();
    let mut cursor = Some(0);
    while let Some(at) = cursor {
        let page = contract.paginated_movies(at, PAGE_SIZE).await?;
        cursor = next_cursor(at, page.movies.len(), page.total);
        movies.extend(
            page.movies
                .into_iter()
                .filter(|m| pricing::addr_eq(&m.owner, &address)),
        );
    }
    let total_rentals = movies.iter().map(|m| m.rental_count).sum();
    let approx_earnings = Amount(
        movies
            .iter()
            .map(|m| pricing::approx_earnings(m).0)
            .sum(),
    );

    Ok(Json(OwnerDashboard {
        profile,
        movies,
        total_rentals,
        approx_earnings,
    }))
}

/// Memes minted by a user, enumerated through the `userMemeIds` index until
/// it runs out.
pub async fn user_memes(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Vec<MemeView>>, Error> {
    const MAX_MEMES: u64 = 100;

    let contract = state.contract();
    let mut views = Vec::new();
    for index in 0..MAX_MEMES {
        // The index accessor reverts past the end; that ends the listing.
        // Transport failures are not an empty list and must surface.
        let id = match contract.user_meme_id(&address, index).await {
            Ok(id) => id,
            Err(Error::Contract(_)) => break,
            Err(e) => return Err(e),
        };
        if let Some(meme) = contract.meme(id).await? {
            let image_url = cid_url(&state, &meme.image_cid);
            views.push(MemeView { meme, image_url });
        }
    }
    Ok(Json(views))
}

// --- Fees, spotlight, tx status ---

pub async fn fees(State(state): State<Arc<AppState>>) -> Result<Json<FeesResponse>, Error> {
    let contract = state.contract();
    let upload_fee = contract.upload_fee().await?;
    let meme_fee = contract.meme_fee().await?;
    Ok(Json(FeesResponse {
        upload_fee,
        meme_fee,
    }))
}

pub async fn spotlight(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SpotlightResponse>, Error> {
    let meme = state.contract().spotlight_meme().await?;
    let image_url = meme.as_ref().and_then(|m| cid_url(&state, &m.image_cid));
    Ok(Json(SpotlightResponse { meme, image_url }))
}

#[derive(Debug, Deserialize)]
pub struct CallerQuery {
    pub caller: Option<String>,
}

pub async fn spotlight_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallerQuery>,
) -> Result<Json<SpotlightStatusResponse>, Error> {
    let contract = state.contract();
    let owner = contract.platform_owner().await;
    let last = contract.last_spotlight_timestamp().await?;
    let spotlight = contract.spotlight_meme().await?;

    let caller_is_owner = match (&query.caller, &owner) {
        (Some(caller), Some(owner)) => Some(pricing::addr_eq(caller, owner)),
        _ => None,
    };

    Ok(Json(SpotlightStatusResponse {
        owner,
        caller_is_owner,
        last_spotlight_timestamp: last,
        available: spotlight_available(last, now_secs()),
        spotlight,
    }))
}

pub async fn tx_status(
    State(state): State<Arc<AppState>>,
    Path(tx_hash): Path<String>,
) -> Result<Json<TxStatus>, Error> {
    let status = state.contract().transaction_status(&tx_hash).await?;
    Ok(Json(status))
}

// --- Writes ---

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub username: String,
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<Json<TxResponse>, Error> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(Error::Validation("username must not be empty".into()));
    }
    let tx_hash = state.contract().create_profile(username).await?;
    info!(username, tx_hash = %tx_hash, "profile creation submitted");
    Ok(Json(TxResponse::submitted(tx_hash)))
}

#[derive(Debug, Deserialize)]
pub struct UploadMovieRequest {
    pub uploader: String,
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub description: String,
    pub film_cid: String,
    pub trailer_cid: Option<String>,
    pub thumbnail_cid: Option<String>,
    /// User-entered 48-hour price; the per-day rate is derived from it.
    pub price_48h: Amount,
}

pub async fn upload_movie(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadMovieRequest>,
) -> Result<Json<TxResponse>, Error> {
    if request.title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".into()));
    }
    if request.price_48h == Amount(0) {
        return Err(Error::Validation("48h price must be positive".into()));
    }
    gate_movie_submission(
        &request.film_cid,
        request.trailer_cid.as_deref(),
        request.thumbnail_cid.as_deref(),
    )?;

    let contract = state.contract();
    let profile = contract.user_profile(&request.uploader).await?;
    if !profile.exists {
        return Err(Error::Validation(
            "create a profile before uploading a movie".into(),
        ));
    }

    let price_per_day = pricing::price_per_day_from_48h(request.price_48h);
    let upload_fee = contract.upload_fee().await?;
    let tx_hash = contract
        .upload_movie(
            request.title.trim(),
            &request.genre,
            &request.description,
            &request.film_cid,
            request.trailer_cid.as_deref().unwrap_or(""),
            request.thumbnail_cid.as_deref().unwrap_or(""),
            price_per_day,
            upload_fee,
        )
        .await?;
    info!(title = %request.title.trim(), tx_hash = %tx_hash, "movie upload submitted");
    Ok(Json(TxResponse::submitted(tx_hash)))
}

#[derive(Debug, Deserialize)]
pub struct PricePreviewQuery {
    pub price_48h: Amount,
}

/// Upload-form price preview: derived per-day rate plus informational 72h
/// and 1-week projections. Nothing here is ever submitted.
pub async fn price_preview(
    Query(query): Query<PricePreviewQuery>,
) -> Result<Json<PriceProjection>, Error> {
    Ok(Json(PriceProjection {
        price_48h: query.price_48h,
        price_per_day: pricing::price_per_day_from_48h(query.price_48h),
        projected_72h: pricing::projected_72h(query.price_48h),
        projected_1w: pricing::projected_1w(query.price_48h),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RentRequest {
    pub renter: String,
    pub duration: String,
}

/// Rent a movie. The payment amount is recomputed here; discount
/// eligibility at submission time, not from an earlier quote.
pub async fn rent_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<RentRequest>,
) -> Result<Json<TxResponse>, Error> {
    let movie = lookup_movie(&state, &id).await?;
    pricing::check_self_rental(&request.renter, &movie)?;
    let bucket = pricing::DurationBucket::parse(&request.duration)?;

    let contract = state.contract();
    let profile = contract.user_profile(&request.renter).await?;
    let quote = build_quote(&movie, bucket, Some(&profile), now_secs());

    let tx_hash = contract
        .rent_movie(movie.id, bucket.days(), quote.final_cost)
        .await?;
    info!(
        movie_id = movie.id,
        days = bucket.days(),
        payment = %quote.final_cost,
        discount = quote.discount_applied,
        tx_hash,
        "rental submitted"
    );
    Ok(Json(TxResponse::submitted(tx_hash)))
}

#[derive(Debug, Deserialize)]
pub struct MintMemeRequest {
    pub creator: String,
    pub title: String,
    pub image_cid: String,
}

pub async fn mint_meme(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MintMemeRequest>,
) -> Result<Json<TxResponse>, Error> {
    if request.title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".into()));
    }
    gate_meme_submission(&request.image_cid)?;

    let contract = state.contract();
    let profile = contract.user_profile(&request.creator).await?;
    if !profile.exists {
        return Err(Error::Validation(
            "create a profile before minting a meme".into(),
        ));
    }

    let meme_fee = contract.meme_fee().await?;
    let tx_hash = contract
        .mint_meme(request.title.trim(), &request.image_cid, meme_fee)
        .await?;
    info!(title = %request.title.trim(), tx_hash = %tx_hash, "meme mint submitted");
    Ok(Json(TxResponse::submitted(tx_hash)))
}

// --- Admin ---

#[derive(Debug, Deserialize)]
pub struct SetFeesRequest {
    pub upload_fee: Amount,
    pub meme_fee: Amount,
}

pub async fn set_fees(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetFeesRequest>,
) -> Result<Json<TxResponse>, Error> {
    let tx_hash = state
        .contract()
        .set_fees(request.upload_fee, request.meme_fee)
        .await?;
    Ok(Json(TxResponse::submitted(tx_hash)))
}

pub async fn withdraw_balance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TxResponse>, Error> {
    let tx_hash = state.contract().withdraw_balance().await?;
    Ok(Json(TxResponse::submitted(tx_hash)))
}

#[derive(Debug, Deserialize)]
pub struct TriggerSpotlightRequest {
    pub caller: Option<String>,
}

/// Trigger spotlight selection. The owner check here is advisory; if it is
/// wrong or stale the contract's own owner-only revert comes back as a
/// friendly transaction error.
pub async fn trigger_spotlight(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TriggerSpotlightRequest>,
) -> Result<Json<TxResponse>, Error> {
    let contract = state.contract();

    if let (Some(caller), Some(owner)) = (request.caller.as_deref(), contract.platform_owner().await)
    {
        if !pricing::addr_eq(caller, &owner) {
            return Err(Error::Validation(
                "only the contract owner can trigger spotlight selection".into(),
            ));
        }
    }

    let last = contract.last_spotlight_timestamp().await?;
    if !spotlight_available(last, now_secs()) {
        return Err(Error::Validation(
            "spotlight can only be triggered once every 24 hours".into(),
        ));
    }

    let tx_hash = contract.request_spotlight_winner().await?;
    info!(tx_hash = %tx_hash, "spotlight selection submitted");
    Ok(Json(TxResponse::submitted(tx_hash)))
}

// --- Helpers ---

async fn lookup_movie(state: &AppState, raw_id: &str) -> Result<Movie, Error> {
    let id = parse_movie_id(raw_id)?;
    state
        .contract()
        .movie(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no movie with id {id}")))
}

/// An unparseable id in a navigation path is a distinct not-found, never a
/// crash or a blank response.
fn parse_movie_id(raw: &str) -> Result<u64, Error> {
    raw.parse::<u64>()
        .map_err(|_| Error::NotFound(format!("no movie with id {raw}")))
}

fn build_quote(
    movie: &Movie,
    bucket: pricing::DurationBucket,
    profile: Option<&UserProfile>,
    now: u64,
) -> QuoteResponse {
    let base_cost = pricing::rental_cost(movie.price_per_day, bucket);
    let final_cost = pricing::final_cost(base_cost, profile, now);
    let (owner_share, platform_share) = pricing::revenue_split(final_cost);
    QuoteResponse {
        movie_id: movie.id,
        duration: match bucket {
            pricing::DurationBucket::H48 => "48h".into(),
            pricing::DurationBucket::H72 => "72h".into(),
            pricing::DurationBucket::OneWeek => "1w".into(),
        },
        days: bucket.days(),
        base_cost,
        discount_applied: final_cost != base_cost,
        final_cost,
        owner_share,
        platform_share,
    }
}

/// Where to resume a catalog walk, or `None` once the page reported it is
/// exhausted (empty page, or the cursor reached the advertised total).
fn next_cursor(cursor: u64, fetched: usize, total: u64) -> Option<u64> {
    if fetched == 0 {
        return None;
    }
    let next = cursor + fetched as u64;
    (next < total).then_some(next)
}

fn cid_url(state: &AppState, cid: &str) -> Option<String> {
    (!cid.is_empty()).then(|| state.config.ipfs_url(cid))
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(price_per_day: u128) -> Movie {
        Movie {
            id: 9,
            owner: "0xOwner".into(),
            title: "t".into(),
            genre: String::new(),
            description: String::new(),
            film_cid: "bafyfilm".into(),
            trailer_cid: String::new(),
            thumbnail_cid: String::new(),
            price_per_day: Amount(price_per_day),
            rental_count: 0,
            listed: true,
        }
    }

    #[test]
    fn test_unparseable_movie_id_is_not_found() {
        let err = parse_movie_id("abc").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(parse_movie_id("17").is_ok());
    }

    #[test]
    fn test_catalog_walk_covers_every_page() {
        // 1200 movies at 500 a page takes three fetches.
        assert_eq!(next_cursor(0, 500, 1200), Some(500));
        assert_eq!(next_cursor(500, 500, 1200), Some(1000));
        assert_eq!(next_cursor(1000, 200, 1200), None);
        // Short or empty pages stop the walk.
        assert_eq!(next_cursor(0, 0, 1200), None);
        assert_eq!(next_cursor(0, 3, 3), None);
    }

    #[test]
    fn test_quote_applies_discount_at_request_time() {
        let profile = UserProfile {
            username: "a".into(),
            exists: true,
            has_discount: true,
            discount_expiry_timestamp: 2000,
        };
        let q = build_quote(
            &movie(1000),
            pricing::DurationBucket::OneWeek,
            Some(&profile),
            1000,
        );
        assert_eq!(q.base_cost, Amount(7000));
        assert!(q.discount_applied);
        assert_eq!(q.final_cost, Amount(5600));
        assert_eq!(q.owner_share, Amount(5040));
        assert_eq!(q.platform_share, Amount(560));

        // Same quote after expiry: full price.
        let q = build_quote(
            &movie(1000),
            pricing::DurationBucket::OneWeek,
            Some(&profile),
            2000,
        );
        assert!(!q.discount_applied);
        assert_eq!(q.final_cost, Amount(7000));
    }
}
