//! HTTP boundary: query parsing, response envelope, and status mapping.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lyriq_core::{CaptionFormat, CaptionLines, LyriqError};
use lyriq_spotify::{
    extract_track_id, FileTokenCache, LyricsClient, TokenManager, TotpSecret,
};

use crate::config::ServerConfig;

/// Shared per-process services.
pub struct AppState {
    token_manager: TokenManager,
    lyrics: LyricsClient,
}

impl AppState {
    /// Build the process state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ServerConfig) -> lyriq_core::Result<Self> {
        let client = lyriq_spotify::build_http_client()?;
        let cache = FileTokenCache::new(config.token_cache_path.clone());
        let token_manager = TokenManager::new(
            config.sp_dc.clone(),
            TotpSecret::default(),
            client.clone(),
            Box::new(cache),
        );
        let lyrics = LyricsClient::new(client);

        Ok(Self {
            token_manager,
            lyrics,
        })
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_lyrics))
        .with_state(Arc::new(state))
}

#[derive(Debug, Default, Deserialize)]
pub struct LyricsParams {
    trackid: Option<String>,
    url: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LyricsEnvelope {
    error: bool,
    sync_type: String,
    lines: CaptionLines,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: bool,
    message: String,
}

async fn get_lyrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LyricsParams>,
) -> Response {
    let Some(track_id) = resolve_track_id(&params) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "url or trackid parameter is required!",
        );
    };
    let format = CaptionFormat::parse(params.format.as_deref());

    match fetch_and_render(&state, &track_id, format).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                warn!("Request for track {track_id} failed: {e}");
            }
            error_response(status, &e.to_string())
        }
    }
}

async fn fetch_and_render(
    state: &AppState,
    track_id: &str,
    format: CaptionFormat,
) -> lyriq_core::Result<LyricsEnvelope> {
    let credentials = state.token_manager.ensure_valid_tokens().await?;
    let payload = state.lyrics.fetch_raw_lyrics(track_id, &credentials).await?;

    Ok(LyricsEnvelope {
        error: false,
        sync_type: payload.sync_type,
        lines: format.render(payload.lines),
    })
}

/// Pick the track ID from the request: an explicit `trackid` wins,
/// otherwise it is extracted from the pasted share `url`.
fn resolve_track_id(params: &LyricsParams) -> Option<String> {
    if let Some(track_id) = params.trackid.as_ref().filter(|id| !id.is_empty()) {
        return Some(track_id.clone());
    }
    params
        .url
        .as_deref()
        .and_then(extract_track_id)
        .map(str::to_string)
}

/// Map the closed error taxonomy onto HTTP status codes.
///
/// The mapping is an explicit match per kind, never inferred from error
/// source identity.
fn status_for(error: &LyriqError) -> StatusCode {
    match error {
        LyriqError::LyricsNotFound { .. } => StatusCode::NOT_FOUND,
        LyriqError::InvalidCredential => StatusCode::FORBIDDEN,
        LyriqError::TokenExchange { source }
            if matches!(**source, LyriqError::InvalidCredential) =>
        {
            StatusCode::FORBIDDEN
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorEnvelope {
            error: true,
            message: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyriq_core::RawLyricLine;

    fn params(trackid: Option<&str>, url: Option<&str>) -> LyricsParams {
        LyricsParams {
            trackid: trackid.map(str::to_string),
            url: url.map(str::to_string),
            format: None,
        }
    }

    #[test]
    fn test_resolve_prefers_explicit_trackid() {
        let resolved = resolve_track_id(&params(
            Some("explicit"),
            Some("https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh"),
        ));
        assert_eq!(resolved.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_resolve_falls_back_to_url() {
        let resolved = resolve_track_id(&params(
            None,
            Some("https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh?si=xyz"),
        ));
        assert_eq!(resolved.as_deref(), Some("4iV5W9uYEdYUVa79Axb7Rh"));
    }

    #[test]
    fn test_resolve_empty_trackid_falls_back_to_url() {
        let resolved = resolve_track_id(&params(
            Some(""),
            Some("spotify:track:4iV5W9uYEdYUVa79Axb7Rh"),
        ));
        assert_eq!(resolved.as_deref(), Some("4iV5W9uYEdYUVa79Axb7Rh"));
    }

    #[test]
    fn test_resolve_nothing_given() {
        assert_eq!(resolve_track_id(&params(None, None)), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&LyriqError::LyricsNotFound {
                track_id: "x".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&LyriqError::InvalidCredential),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&LyriqError::TokenExchange {
                source: Box::new(LyriqError::InvalidCredential)
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&LyriqError::Protocol {
                reason: "bad".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&LyriqError::TokenExchange {
                source: Box::new(LyriqError::Protocol {
                    reason: "bad".to_string()
                })
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_success_envelope_wire_shape() {
        let envelope = LyricsEnvelope {
            error: false,
            sync_type: "LINE_SYNCED".to_string(),
            lines: CaptionFormat::Lrc.render(vec![RawLyricLine {
                start_time_ms: 61_234,
                words: "x".to_string(),
            }]),
        };

        let value = serde_json::to_value(envelope).expect("serialization should succeed");
        assert_eq!(value["error"], false);
        assert_eq!(value["syncType"], "LINE_SYNCED");
        assert_eq!(value["lines"][0]["timeTag"], "01:01.23");
        assert_eq!(value["lines"][0]["words"], "x");
    }

    #[test]
    fn test_error_envelope_wire_shape() {
        let value = serde_json::to_value(ErrorEnvelope {
            error: true,
            message: "lyrics for this track is not available".to_string(),
        })
        .expect("serialization should succeed");
        assert_eq!(value["error"], true);
        assert!(value["message"].is_string());
    }
}
