//! Authenticated lyrics retrieval from the provider.

use serde::Deserialize;
use tracing::{debug, info};

use lyriq_core::{LyriqError, RawLyricLine, Result};

use crate::token_cache::CredentialSet;
use crate::USER_AGENT;

/// Base URL of the provider's lyrics endpoint.
const LYRICS_URL: &str = "https://spclient.wg.spotify.com/color-lyrics/v2/track";

/// Raw lyric payload for a track.
#[derive(Debug, Clone)]
pub struct LyricsPayload {
    /// Provider sync type, e.g. `LINE_SYNCED` or `UNSYNCED`.
    pub sync_type: String,
    pub lines: Vec<RawLyricLine>,
}

#[derive(Debug, Deserialize)]
struct LyricsEnvelope {
    lyrics: Option<LyricsBody>,
}

#[derive(Debug, Deserialize)]
struct LyricsBody {
    #[serde(rename = "syncType")]
    sync_type: String,
    lines: Vec<WireLine>,
}

/// The provider sends `startTimeMs` as a JSON string.
#[derive(Debug, Deserialize)]
struct WireLine {
    #[serde(rename = "startTimeMs")]
    start_time_ms: String,
    words: String,
}

/// Issues authenticated lyric requests using a valid credential set.
pub struct LyricsClient {
    client: reqwest::Client,
}

impl LyricsClient {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the raw lyric payload for a track. One authenticated GET,
    /// both tokens attached as headers.
    ///
    /// # Errors
    ///
    /// Returns [`LyriqError::LyricsNotFound`] when the provider has no
    /// lyrics for the track (an expected outcome, distinct from transport
    /// failures), [`LyriqError::Network`] on transport failure, and
    /// [`LyriqError::Protocol`] on an unexpected response shape or status.
    pub async fn fetch_raw_lyrics(
        &self,
        track_id: &str,
        credentials: &CredentialSet,
    ) -> Result<LyricsPayload> {
        let access_token =
            credentials
                .access_token
                .as_deref()
                .ok_or_else(|| LyriqError::Protocol {
                    reason: "credential set has no access token".to_string(),
                })?;

        let url = format!("{LYRICS_URL}/{track_id}?format=json&market=from_token");
        debug!("Lyrics request: {url}");

        let mut request = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("App-Platform", "WebPlayer")
            .header("Authorization", format!("Bearer {access_token}"));
        if let Some(client_token) = credentials.client_token.as_deref() {
            request = request.header("client-token", client_token);
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!("No lyrics available for track {track_id}");
            return Err(LyriqError::LyricsNotFound {
                track_id: track_id.to_string(),
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(LyriqError::Protocol {
                reason: format!("lyrics endpoint returned HTTP {status}"),
            });
        }

        let envelope: LyricsEnvelope = response.json().await.map_err(|e| LyriqError::Protocol {
            reason: format!("lyrics response: {e}"),
        })?;

        let Some(lyrics) = envelope.lyrics else {
            info!("Provider returned no lyric body for track {track_id}");
            return Err(LyriqError::LyricsNotFound {
                track_id: track_id.to_string(),
            });
        };

        let lines = lyrics
            .lines
            .into_iter()
            .map(|line| RawLyricLine {
                start_time_ms: line.start_time_ms.parse().unwrap_or(0),
                words: line.words,
            })
            .collect();

        Ok(LyricsPayload {
            sync_type: lyrics.sync_type,
            lines,
        })
    }
}

/// Extract a track ID from a provider track reference.
///
/// Handles the formats users paste in:
/// - `spotify:track:4iV5W9uYEdYUVa79Axb7Rh`
/// - `https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh?si=...`
/// - `4iV5W9uYEdYUVa79Axb7Rh`
#[must_use]
pub fn extract_track_id(reference: &str) -> Option<&str> {
    if let Some(stripped) = reference.strip_prefix("spotify:track:") {
        return Some(stripped);
    }

    if reference.contains("spotify.com/track/") {
        let parts: Vec<&str> = reference.split("/track/").collect();
        if parts.len() >= 2 {
            // Drop any query parameters
            return parts[1].split('?').next();
        }
    }

    // Assume it's already a track ID if it's 22 chars (base62)
    if reference.len() == 22 && reference.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(reference);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_track_id_from_uri() {
        assert_eq!(
            extract_track_id("spotify:track:4iV5W9uYEdYUVa79Axb7Rh"),
            Some("4iV5W9uYEdYUVa79Axb7Rh")
        );
    }

    #[test]
    fn test_extract_track_id_from_url() {
        assert_eq!(
            extract_track_id("https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh"),
            Some("4iV5W9uYEdYUVa79Axb7Rh")
        );
    }

    #[test]
    fn test_extract_track_id_strips_query_parameters() {
        assert_eq!(
            extract_track_id("https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh?si=abcdef"),
            Some("4iV5W9uYEdYUVa79Axb7Rh")
        );
    }

    #[test]
    fn test_extract_track_id_bare_id() {
        assert_eq!(
            extract_track_id("4iV5W9uYEdYUVa79Axb7Rh"),
            Some("4iV5W9uYEdYUVa79Axb7Rh")
        );
    }

    #[test]
    fn test_extract_track_id_rejects_garbage() {
        assert_eq!(extract_track_id("not a track reference"), None);
        assert_eq!(extract_track_id(""), None);
    }

    #[test]
    fn test_wire_line_start_time_is_a_string() {
        let envelope: LyricsEnvelope = serde_json::from_str(
            r#"{
                "lyrics": {
                    "syncType": "LINE_SYNCED",
                    "lines": [
                        {"startTimeMs": "1530", "words": "hello"},
                        {"startTimeMs": "oops", "words": "world"}
                    ]
                }
            }"#,
        )
        .expect("deserialization should succeed");

        let lyrics = envelope.lyrics.expect("lyrics body should be present");
        assert_eq!(lyrics.sync_type, "LINE_SYNCED");
        assert_eq!(lyrics.lines[0].start_time_ms, "1530");
        // Unparseable offsets fall back to zero at conversion time
        assert_eq!(lyrics.lines[1].start_time_ms.parse::<i64>().unwrap_or(0), 0);
    }

    #[test]
    fn test_missing_lyrics_body_parses_as_none() {
        let envelope: LyricsEnvelope =
            serde_json::from_str("{}").expect("deserialization should succeed");
        assert!(envelope.lyrics.is_none());
    }
}
