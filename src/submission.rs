//! Upload/mint submission state machines and file validation.
//!
//! One submission covers a single upload form session: per-slot upload
//! tracking (film, trailer, thumbnail, or a meme image), an aggregate phase,
//! and the local guard that refuses to hit the contract before every selected
//! slot finished uploading. Uploads within a submission run sequentially so
//! aggregate progress is deterministic.

use crate::error::Error;
use serde::Serialize;

const MB: u64 = 1024 * 1024;

const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/mov",
    "video/avi",
    "video/quicktime",
    "video/x-msvideo",
];
const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// The kind of content going into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Film,
    Trailer,
    Thumbnail,
    MemeImage,
}

impl SlotKind {
    fn max_bytes(self) -> u64 {
        match self {
            SlotKind::Film => 1024 * MB,
            SlotKind::Trailer => 500 * MB,
            SlotKind::Thumbnail | SlotKind::MemeImage => 10 * MB,
        }
    }

    fn allowed_types(self) -> &'static [&'static str] {
        match self {
            SlotKind::Film | SlotKind::Trailer => VIDEO_TYPES,
            SlotKind::Thumbnail | SlotKind::MemeImage => IMAGE_TYPES,
        }
    }
}

/// Validate a file against the slot's size cap and content-type allow list.
pub fn validate_file(kind: SlotKind, size_bytes: u64, content_type: &str) -> Result<(), Error> {
    if size_bytes > kind.max_bytes() {
        return Err(Error::Validation(format!(
            "file size exceeds {} MB limit",
            kind.max_bytes() / MB
        )));
    }
    if !kind
        .allowed_types()
        .iter()
        .any(|t| t.eq_ignore_ascii_case(content_type))
    {
        return Err(Error::Validation(format!(
            "file type {content_type} not allowed"
        )));
    }
    Ok(())
}

/// Per-slot upload status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SlotStatus {
    Pending,
    Uploading,
    Completed { cid: String },
    Error,
}

/// Aggregate submission phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Uploading,
    Uploaded,
    Submitting,
    Confirmed,
    Error,
}

/// A single upload/mint submission session.
#[derive(Debug)]
pub struct Submission {
    slots: Vec<(SlotKind, SlotStatus)>,
    phase: Phase,
}

impl Submission {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Select a file for a slot. Re-selecting resets the slot to pending,
    /// and a fresh pending slot takes the submission back out of `Uploaded`.
    pub fn select(&mut self, kind: SlotKind) {
        if let Some(slot) = self.slots.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = SlotStatus::Pending;
        } else {
            self.slots.push((kind, SlotStatus::Pending));
        }
        if self.phase == Phase::Uploaded {
            self.phase = Phase::Uploading;
        }
    }

    pub fn slot_status(&self, kind: SlotKind) -> Option<&SlotStatus> {
        self.slots.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }

    /// CID of a completed slot, if any.
    pub fn cid(&self, kind: SlotKind) -> Option<&str> {
        match self.slot_status(kind) {
            Some(SlotStatus::Completed { cid }) => Some(cid.as_str()),
            _ => None,
        }
    }

    /// Mark a slot as uploading.
    pub fn begin_upload(&mut self, kind: SlotKind) -> Result<(), Error> {
        let slot = self
            .slots
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .ok_or_else(|| Error::Validation("no file selected for this slot".into()))?;
        slot.1 = SlotStatus::Uploading;
        self.phase = Phase::Uploading;
        Ok(())
    }

    /// Record a successful pin. Flips the phase to `Uploaded` once every
    /// selected slot is done.
    pub fn complete_upload(&mut self, kind: SlotKind, cid: String) {
        if let Some(slot) = self.slots.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = SlotStatus::Completed { cid };
        }
        if self.all_completed() {
            self.phase = Phase::Uploaded;
        }
    }

    /// Record a failed pin. The whole submission goes to `Error`.
    pub fn fail_upload(&mut self, kind: SlotKind) {
        if let Some(slot) = self.slots.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = SlotStatus::Error;
        }
        self.phase = Phase::Error;
    }

    fn all_completed(&self) -> bool {
        !self.slots.is_empty()
            && self
                .slots
                .iter()
                .all(|(_, s)| matches!(s, SlotStatus::Completed { .. }))
    }

    /// Aggregate progress as `(completed, total)` over selected slots.
    pub fn progress(&self) -> (usize, usize) {
        let done = self
            .slots
            .iter()
            .filter(|(_, s)| matches!(s, SlotStatus::Completed { .. }))
            .count();
        (done, self.slots.len())
    }

    /// Move to `Submitting`. Only legal from `Uploaded`; anything earlier is
    /// a local validation error and no write call may be attempted.
    pub fn try_submit(&mut self) -> Result<(), Error> {
        if self.phase != Phase::Uploaded || !self.all_completed() {
            return Err(Error::Validation(
                "all files must finish uploading before submitting".into(),
            ));
        }
        self.phase = Phase::Submitting;
        Ok(())
    }

    /// The transaction confirmed; the session is finished.
    pub fn confirm(&mut self) {
        self.phase = Phase::Confirmed;
    }

    /// A relay or transaction error occurred mid-submission.
    pub fn fail_submission(&mut self) {
        self.phase = Phase::Error;
    }

    /// Reset after an error so the user may retry. Completed uploads are
    /// kept; the phase returns to `Uploaded` if everything is pinned, else
    /// `Idle`.
    pub fn reset(&mut self) {
        self.phase = if self.all_completed() {
            Phase::Uploaded
        } else {
            Phase::Idle
        };
    }
}

impl Default for Submission {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive the submission machine for a movie upload: film is mandatory,
/// trailer and thumbnail count only if provided. Errs unless every selected
/// slot holds a pinned CID.
pub fn gate_movie_submission(
    film_cid: &str,
    trailer_cid: Option<&str>,
    thumbnail_cid: Option<&str>,
) -> Result<(), Error> {
    let mut sub = Submission::new();
    sub.select(SlotKind::Film);
    if !film_cid.is_empty() {
        sub.complete_upload(SlotKind::Film, film_cid.into());
    }
    for (kind, cid) in [
        (SlotKind::Trailer, trailer_cid),
        (SlotKind::Thumbnail, thumbnail_cid),
    ] {
        if let Some(cid) = cid {
            sub.select(kind);
            if !cid.is_empty() {
                sub.complete_upload(kind, cid.into());
            }
        }
    }
    sub.try_submit()
}

/// Same gate for a meme mint: a single mandatory image slot.
pub fn gate_meme_submission(image_cid: &str) -> Result<(), Error> {
    let mut sub = Submission::new();
    sub.select(SlotKind::MemeImage);
    if !image_cid.is_empty() {
        sub.complete_upload(SlotKind::MemeImage, image_cid.into());
    }
    sub.try_submit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_limits() {
        assert!(validate_file(SlotKind::Thumbnail, 9 * MB, "image/png").is_ok());
        assert!(validate_file(SlotKind::Thumbnail, 11 * MB, "image/png").is_err());
        assert!(validate_file(SlotKind::Film, 900 * MB, "video/mp4").is_ok());
        assert!(validate_file(SlotKind::Film, 2048 * MB, "video/mp4").is_err());
        assert!(validate_file(SlotKind::Trailer, 501 * MB, "video/mp4").is_err());
    }

    #[test]
    fn test_validate_file_types() {
        assert!(validate_file(SlotKind::Film, 1, "image/png").is_err());
        assert!(validate_file(SlotKind::MemeImage, 1, "video/mp4").is_err());
        assert!(validate_file(SlotKind::MemeImage, 1, "image/webp").is_ok());
        assert!(validate_file(SlotKind::Film, 1, "video/quicktime").is_ok());
    }

    #[test]
    fn test_submit_before_uploads_complete_is_rejected() {
        let mut sub = Submission::new();
        sub.select(SlotKind::MemeImage);
        assert!(sub.try_submit().is_err());
        sub.begin_upload(SlotKind::MemeImage).unwrap();
        assert!(sub.try_submit().is_err());
        sub.complete_upload(SlotKind::MemeImage, "bafyimg".into());
        assert_eq!(sub.phase(), Phase::Uploaded);
        assert!(sub.try_submit().is_ok());
        assert_eq!(sub.phase(), Phase::Submitting);
    }

    #[test]
    fn test_empty_submission_never_reaches_uploaded() {
        let mut sub = Submission::new();
        assert!(sub.try_submit().is_err());
    }

    #[test]
    fn test_sequential_progress() {
        let mut sub = Submission::new();
        sub.select(SlotKind::Film);
        sub.select(SlotKind::Trailer);
        sub.select(SlotKind::Thumbnail);
        assert_eq!(sub.progress(), (0, 3));

        sub.begin_upload(SlotKind::Film).unwrap();
        sub.complete_upload(SlotKind::Film, "f".into());
        assert_eq!(sub.progress(), (1, 3));
        assert_eq!(sub.phase(), Phase::Uploading);

        sub.begin_upload(SlotKind::Trailer).unwrap();
        sub.complete_upload(SlotKind::Trailer, "t".into());
        sub.begin_upload(SlotKind::Thumbnail).unwrap();
        sub.complete_upload(SlotKind::Thumbnail, "th".into());
        assert_eq!(sub.progress(), (3, 3));
        assert_eq!(sub.phase(), Phase::Uploaded);
        assert_eq!(sub.cid(SlotKind::Film), Some("f"));
    }

    #[test]
    fn test_upload_failure_sets_error_and_reset_retries() {
        let mut sub = Submission::new();
        sub.select(SlotKind::Film);
        sub.begin_upload(SlotKind::Film).unwrap();
        sub.fail_upload(SlotKind::Film);
        assert_eq!(sub.phase(), Phase::Error);
        sub.reset();
        assert_eq!(sub.phase(), Phase::Idle);
    }

    #[test]
    fn test_select_after_uploaded_blocks_submit() {
        let mut sub = Submission::new();
        sub.select(SlotKind::Film);
        sub.begin_upload(SlotKind::Film).unwrap();
        sub.complete_upload(SlotKind::Film, "bafyfilm".into());
        assert_eq!(sub.phase(), Phase::Uploaded);

        // Adding another slot reopens the upload phase.
        sub.select(SlotKind::Trailer);
        assert!(sub.try_submit().is_err());

        sub.begin_upload(SlotKind::Trailer).unwrap();
        sub.complete_upload(SlotKind::Trailer, "bafyt".into());
        assert!(sub.try_submit().is_ok());
    }

    #[test]
    fn test_movie_gate_requires_film_cid() {
        assert!(gate_movie_submission("", None, None).is_err());
        assert!(gate_movie_submission("bafyfilm", None, None).is_ok());
        // A selected-but-unpinned trailer blocks submission.
        assert!(gate_movie_submission("bafyfilm", Some(""), None).is_err());
        assert!(gate_movie_submission("bafyfilm", Some("bafyt"), Some("bafyth")).is_ok());
    }

    #[test]
    fn test_meme_gate_requires_image() {
        assert!(gate_meme_submission("").is_err());
        assert!(gate_meme_submission("bafyimg").is_ok());
    }

    #[test]
    fn test_tx_failure_keeps_completed_uploads() {
        let mut sub = Submission::new();
        sub.select(SlotKind::MemeImage);
        sub.begin_upload(SlotKind::MemeImage).unwrap();
        sub.complete_upload(SlotKind::MemeImage, "bafyimg".into());
        sub.try_submit().unwrap();
        sub.fail_submission();
        assert_eq!(sub.phase(), Phase::Error);
        sub.reset();
        // Pinned content survives the failed transaction.
        assert_eq!(sub.phase(), Phase::Uploaded);
        assert_eq!(sub.cid(SlotKind::MemeImage), Some("bafyimg"));
    }
}
