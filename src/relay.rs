//! Media relay: pass-through pinning of files and JSON documents.
//!
//! Forwards uploads to the Pinata API and returns the resulting CID without
//! exposing the provider credential to callers. Each call is a single
//! forward-and-return: no retry, no dedup, no caching.

use crate::error::Error;
use crate::state::AppState;
use crate::submission::{validate_file, SlotKind};
use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Fixed source tag attached to all pins.
const SOURCE_TAG: &str = "cinevault";

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    /// Optional slot kind ("film", "trailer", "thumbnail", "meme") enabling
    /// server-side size/type validation.
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadJsonRequest {
    #[serde(rename = "jsonData")]
    pub json_data: Option<Value>,
    pub name: Option<String>,
}

/// `POST /api/pinata/upload-file`: multipart field `file`.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RelayQuery>,
    mut multipart: Multipart,
) -> Result<Json<Value>, Error> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("failed to read file field: {e}")))?;
            file = Some((filename, content_type, bytes.to_vec()));
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| Error::Validation("missing file".into()))?;

    if let Some(kind) = query.kind.as_deref() {
        validate_file(parse_kind(kind)?, bytes.len() as u64, &content_type)?;
    }

    let jwt = credential(&state)?;

    let metadata = json!({
        "name": filename,
        "keyvalues": { "uploadedAt": now_rfc3339(), "source": SOURCE_TAG },
    });
    let options = json!({ "cidVersion": 1 });

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.clone())
        .mime_str(&content_type)
        .map_err(|e| Error::Validation(format!("invalid content type: {e}")))?;
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("pinataMetadata", metadata.to_string())
        .text("pinataOptions", options.to_string());

    let url = format!(
        "{}/pinning/pinFileToIPFS",
        state.config.pinata_api_url.trim_end_matches('/')
    );
    let response = state
        .http
        .post(&url)
        .bearer_auth(jwt)
        .multipart(form)
        .send()
        .await
        .map_err(|e| Error::Relay {
            status: 502,
            body: format!("pinning provider unreachable: {e}"),
        })?;

    let body = forward(response, &filename).await?;
    Ok(Json(body))
}

/// `POST /api/pinata/upload-json`: body `{ jsonData, name }`.
pub async fn upload_json(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadJsonRequest>,
) -> Result<Json<Value>, Error> {
    let content = request
        .json_data
        .ok_or_else(|| Error::Validation("missing jsonData".into()))?;
    let name = request.name.unwrap_or_else(|| "metadata.json".into());

    let jwt = credential(&state)?;

    let body = json!({
        "pinataContent": content,
        "pinataMetadata": {
            "name": name,
            "keyvalues": { "uploadedAt": now_rfc3339(), "source": SOURCE_TAG },
        },
        "pinataOptions": { "cidVersion": 1 },
    });

    let url = format!(
        "{}/pinning/pinJSONToIPFS",
        state.config.pinata_api_url.trim_end_matches('/')
    );
    let response = state
        .http
        .post(&url)
        .bearer_auth(jwt)
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Relay {
            status: 502,
            body: format!("pinning provider unreachable: {e}"),
        })?;

    let body = forward(response, &name).await?;
    Ok(Json(body))
}

fn credential(state: &AppState) -> Result<&str, Error> {
    state
        .pinata_jwt
        .as_deref()
        .ok_or_else(|| Error::Config("PINATA_JWT is not configured".into()))
}

/// Forward the provider response: non-success goes back with the provider's
/// status and body; a non-JSON success body is wrapped, not failed.
async fn forward(response: reqwest::Response, name: &str) -> Result<Value, Error> {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if !status.is_success() {
        warn!(status = status.as_u16(), name, "pinning provider rejected upload");
        return Err(Error::Relay {
            status: status.as_u16(),
            body: if text.is_empty() {
                "pinning provider error".into()
            } else {
                text
            },
        });
    }

    let body = wrap_provider_body(&text);
    if let Some(cid) = extract_cid(&body) {
        info!(name, cid, "content pinned");
    }
    Ok(body)
}

/// Parse the provider body as JSON, wrapping plain text so a non-JSON
/// success still surfaces as valid output.
fn wrap_provider_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// The CID (`IpfsHash`) from a provider response, if present.
pub fn extract_cid(body: &Value) -> Option<&str> {
    body.get("IpfsHash").and_then(Value::as_str)
}

fn parse_kind(s: &str) -> Result<SlotKind, Error> {
    match s {
        "film" => Ok(SlotKind::Film),
        "trailer" => Ok(SlotKind::Trailer),
        "thumbnail" => Ok(SlotKind::Thumbnail),
        "meme" => Ok(SlotKind::MemeImage),
        other => Err(Error::Validation(format!("unknown upload kind: {other}"))),
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_provider_body_passes_json_through() {
        let body = wrap_provider_body(r#"{"IpfsHash":"bafy123","PinSize":42}"#);
        assert_eq!(extract_cid(&body), Some("bafy123"));
    }

    #[test]
    fn test_wrap_provider_body_wraps_plain_text() {
        let body = wrap_provider_body("OK");
        assert_eq!(body, json!({ "raw": "OK" }));
        assert_eq!(extract_cid(&body), None);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("film").unwrap(), SlotKind::Film);
        assert_eq!(parse_kind("meme").unwrap(), SlotKind::MemeImage);
        assert!(parse_kind("poster").is_err());
    }
}
