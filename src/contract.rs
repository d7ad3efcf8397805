//! Typed operations on the CineVault contract.
//!
//! Thin, typed wrapper over the bridge client. Reads are idempotent and
//! side-effect-free; writes return a transaction hash whose lifecycle is
//! `pending -> confirming -> confirmed | failed`. Ownership and access
//! checks live in the contract itself; the owner lookup here is advisory
//! UX only and must never be treated as a security boundary.

use crate::error::Error;
use crate::rpc::RpcClient;
use crate::types::{Amount, Meme, Movie, MoviePage, Rental, UserProfile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Spotlight selection may be re-triggered once per day.
pub const SPOTLIGHT_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Lifecycle of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TxStatus {
    Pending,
    Confirming,
    Confirmed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block: Option<u64>,
    },
    Failed {
        error: String,
    },
}

/// Handle to the contract through a bridge client.
pub struct Contract<'a> {
    rpc: &'a RpcClient,
    address: &'a str,
}

impl<'a> Contract<'a> {
    pub fn new(rpc: &'a RpcClient, address: &'a str) -> Self {
        Self { rpc, address }
    }

    // --- Reads ---

    /// Fetch a movie by id. The contract's id=0 sentinel becomes `None`.
    pub async fn movie(&self, id: u64) -> Result<Option<Movie>, Error> {
        let movie: Movie = self.view("movies", json!([id])).await?;
        Ok(movie.is_found().then_some(movie))
    }

    pub async fn paginated_movies(&self, cursor: u64, size: u64) -> Result<MoviePage, Error> {
        self.view("getPaginatedMovies", json!([cursor, size])).await
    }

    pub async fn user_rentals(&self, address: &str) -> Result<Vec<Rental>, Error> {
        self.view("getUserRentals", json!([address])).await
    }

    pub async fn has_active_rental(&self, address: &str, movie_id: u64) -> Result<bool, Error> {
        self.view("hasActiveRental", json!([address, movie_id])).await
    }

    pub async fn user_profile(&self, address: &str) -> Result<UserProfile, Error> {
        self.view("userProfiles", json!([address])).await
    }

    pub async fn meme_fee(&self) -> Result<Amount, Error> {
        self.view("memeFee", json!([])).await
    }

    pub async fn upload_fee(&self) -> Result<Amount, Error> {
        self.view("uploadFee", json!([])).await
    }

    /// The current spotlight meme, if one is selected (pointer id=0 = none).
    pub async fn spotlight_meme(&self) -> Result<Option<Meme>, Error> {
        let meme: Meme = self.view("getSpotlightMeme", json!([])).await?;
        Ok((meme.id != 0).then_some(meme))
    }

    pub async fn meme(&self, id: u64) -> Result<Option<Meme>, Error> {
        let meme: Meme = self.view("memes", json!([id])).await?;
        Ok((meme.id != 0).then_some(meme))
    }

    pub async fn user_meme_id(&self, address: &str, index: u64) -> Result<u64, Error> {
        self.view("userMemeIds", json!([address, index])).await
    }

    pub async fn last_spotlight_timestamp(&self) -> Result<u64, Error> {
        self.view("lastSpotlightTimestamp", json!([])).await
    }

    /// Advisory owner lookup: try `platformOwner()`, fall back to `owner()`.
    /// Non-authoritative: the contract enforces the real owner check, so a
    /// failed lookup is reported as `None`, not an error.
    pub async fn platform_owner(&self) -> Option<String> {
        match self.view::<String>("platformOwner", json!([])).await {
            Ok(addr) if !addr.is_empty() => return Some(addr),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "platformOwner accessor unavailable"),
        }
        match self.view::<String>("owner", json!([])).await {
            Ok(addr) if !addr.is_empty() => Some(addr),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "owner accessor unavailable");
                None
            }
        }
    }

    // --- Writes (payable where the contract says so) ---

    pub async fn create_profile(&self, username: &str) -> Result<String, Error> {
        self.send("createProfile", json!([username]), Amount(0)).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upload_movie(
        &self,
        title: &str,
        genre: &str,
        description: &str,
        film_cid: &str,
        trailer_cid: &str,
        thumbnail_cid: &str,
        price_per_day: Amount,
        upload_fee: Amount,
    ) -> Result<String, Error> {
        self.send(
            "uploadMovie",
            json!([title, genre, description, film_cid, trailer_cid, thumbnail_cid, price_per_day]),
            upload_fee,
        )
        .await
    }

    pub async fn rent_movie(
        &self,
        movie_id: u64,
        num_days: u64,
        payment: Amount,
    ) -> Result<String, Error> {
        self.send("rentMovie", json!([movie_id, num_days]), payment).await
    }

    pub async fn mint_meme(
        &self,
        title: &str,
        image_cid: &str,
        meme_fee: Amount,
    ) -> Result<String, Error> {
        self.send("mintMeme", json!([title, image_cid]), meme_fee).await
    }

    pub async fn set_fees(&self, upload_fee: Amount, meme_fee: Amount) -> Result<String, Error> {
        self.send("setFees", json!([upload_fee, meme_fee]), Amount(0)).await
    }

    pub async fn withdraw_balance(&self) -> Result<String, Error> {
        self.send("withdrawBalance", json!([]), Amount(0)).await
    }

    pub async fn request_spotlight_winner(&self) -> Result<String, Error> {
        self.send("requestSpotlightWinner", json!([]), Amount(0)).await
    }

    /// Lifecycle of a previously submitted transaction. Failures arrive
    /// already translated to a short message.
    pub async fn transaction_status(&self, tx_hash: &str) -> Result<TxStatus, Error> {
        let value = self.rpc.tx_status(tx_hash).await?;
        let status: TxStatus = serde_json::from_value(value)
            .map_err(|e| Error::Rpc(format!("invalid tx status: {e}")))?;
        Ok(match status {
            TxStatus::Failed { error } => TxStatus::Failed {
                error: friendly_tx_error(&error),
            },
            other => other,
        })
    }

    async fn view<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T, Error> {
        let value = self.rpc.view(self.address, method, args).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Rpc(format!("unexpected shape from {method}: {e}")))
    }

    async fn send(&self, method: &str, args: Value, deposit: Amount) -> Result<String, Error> {
        debug!(method, deposit = %deposit, "submitting transaction");
        self.rpc
            .send(self.address, method, args, deposit)
            .await
            .map_err(|e| {
                warn!(method, error = %e, "transaction submission failed");
                match e {
                    Error::Rpc(raw) | Error::Contract(raw) => Error::Tx(friendly_tx_error(&raw)),
                    other => other,
                }
            })
    }
}

/// Whether the spotlight may be re-triggered at `now`.
pub fn spotlight_available(last_spotlight_timestamp: u64, now: u64) -> bool {
    now >= last_spotlight_timestamp + SPOTLIGHT_INTERVAL_SECS
}

/// Translate a raw wallet/chain error into a short human-readable message,
/// preferring a short machine-provided message over a raw dump.
pub fn friendly_tx_error(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("user rejected") || lower.contains("user denied") {
        return "Transaction rejected in wallet.".into();
    }
    if lower.contains("insufficient funds") {
        return "Insufficient funds for this transaction.".into();
    }
    if let Some(idx) = lower.find("execution reverted") {
        // Keep the revert reason if one follows.
        let tail = raw[idx + "execution reverted".len()..]
            .trim_start_matches([':', ' '])
            .trim();
        let reason = tail.lines().next().unwrap_or("").trim();
        if reason.is_empty() {
            return "Transaction reverted by the contract.".into();
        }
        return format!("Transaction reverted: {reason}");
    }
    // Fall back to the first line, clipped.
    let first = raw.lines().next().unwrap_or("Transaction failed").trim();
    if first.chars().count() > 140 {
        let clipped: String = first.chars().take(140).collect();
        format!("{clipped}…")
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_wallet_rejection() {
        let raw = "User rejected the request.\nDetails: ...stack...";
        assert_eq!(friendly_tx_error(raw), "Transaction rejected in wallet.");
    }

    #[test]
    fn test_friendly_revert_reason() {
        let raw = "execution reverted: Only owner can trigger spotlight";
        assert_eq!(
            friendly_tx_error(raw),
            "Transaction reverted: Only owner can trigger spotlight"
        );
    }

    #[test]
    fn test_friendly_bare_revert() {
        assert_eq!(
            friendly_tx_error("execution reverted"),
            "Transaction reverted by the contract."
        );
    }

    #[test]
    fn test_friendly_fallback_first_line() {
        let raw = "something odd happened\nwith a huge dump following";
        assert_eq!(friendly_tx_error(raw), "something odd happened");
    }

    #[test]
    fn test_spotlight_availability_window() {
        let last = 1_000_000;
        assert!(!spotlight_available(last, last + SPOTLIGHT_INTERVAL_SECS - 1));
        assert!(spotlight_available(last, last + SPOTLIGHT_INTERVAL_SECS));
    }

    #[test]
    fn test_tx_status_decode() {
        let confirmed: TxStatus =
            serde_json::from_value(serde_json::json!({"status": "confirmed", "block": 123}))
                .unwrap();
        assert_eq!(confirmed, TxStatus::Confirmed { block: Some(123) });

        let failed: TxStatus = serde_json::from_value(
            serde_json::json!({"status": "failed", "error": "execution reverted: nope"}),
        )
        .unwrap();
        assert_eq!(
            failed,
            TxStatus::Failed {
                error: "execution reverted: nope".into()
            }
        );
    }
}
