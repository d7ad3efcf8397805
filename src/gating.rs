//! Access gating for a (viewer, movie) pair.
//!
//! Three states control what a viewer sees: trailer only, a "rented" prompt,
//! or full playback. Once rented there is no way back to the trailer within
//! a view session.

use crate::error::Error;
use serde::Serialize;

/// Player gating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// No active rental: preview content only.
    Trailer,
    /// Active rental exists; full content available but not yet requested.
    RentedOverlay,
    /// Viewer explicitly requested full playback.
    PlayingFullMovie,
}

impl PlayerState {
    /// Initial state from the active-rental check.
    pub fn from_rental(has_active_rental: bool) -> Self {
        if has_active_rental {
            PlayerState::RentedOverlay
        } else {
            PlayerState::Trailer
        }
    }

    /// Re-evaluate after a rental status change. `Trailer -> RentedOverlay`
    /// happens automatically; an already-playing session is left alone.
    pub fn on_rental_status(self, has_active_rental: bool) -> Self {
        match self {
            PlayerState::Trailer if has_active_rental => PlayerState::RentedOverlay,
            other => other,
        }
    }

    /// Explicit "watch now". Requires an active rental and a non-empty film
    /// CID; otherwise the state is unchanged and a playback error is raised.
    pub fn watch_now(self, film_cid: &str) -> Result<Self, Error> {
        match self {
            PlayerState::RentedOverlay | PlayerState::PlayingFullMovie => {
                if film_cid.is_empty() {
                    Err(Error::Validation(
                        "the full movie file could not be found".into(),
                    ))
                } else {
                    Ok(PlayerState::PlayingFullMovie)
                }
            }
            PlayerState::Trailer => Err(Error::Validation(
                "an active rental is required to watch the full movie".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_follows_rental_check() {
        assert_eq!(PlayerState::from_rental(false), PlayerState::Trailer);
        assert_eq!(PlayerState::from_rental(true), PlayerState::RentedOverlay);
    }

    #[test]
    fn test_trailer_promotes_after_successful_rental() {
        let state = PlayerState::Trailer.on_rental_status(true);
        assert_eq!(state, PlayerState::RentedOverlay);
    }

    #[test]
    fn test_watch_now_with_film_cid() {
        let state = PlayerState::RentedOverlay.watch_now("bafyfilm").unwrap();
        assert_eq!(state, PlayerState::PlayingFullMovie);
    }

    #[test]
    fn test_watch_now_without_film_cid_keeps_state() {
        let state = PlayerState::RentedOverlay;
        assert!(state.watch_now("").is_err());
        // Caller keeps the old state on error.
        assert_eq!(state, PlayerState::RentedOverlay);
    }

    #[test]
    fn test_no_playback_from_trailer() {
        assert!(PlayerState::Trailer.watch_now("bafyfilm").is_err());
    }

    #[test]
    fn test_no_transition_back_to_trailer() {
        // A stale rental-status read never demotes a rented session.
        assert_eq!(
            PlayerState::RentedOverlay.on_rental_status(false),
            PlayerState::RentedOverlay
        );
        assert_eq!(
            PlayerState::PlayingFullMovie.on_rental_status(false),
            PlayerState::PlayingFullMovie
        );
    }
}
