//! Spotify private lyrics API integration.
//!
//! **WARNING:** This talks to an unofficial Spotify API that requires the
//! `sp_dc` cookie from a logged-in Spotify web session. This may violate
//! Spotify's Terms of Service. Use at your own risk.

pub mod auth;
pub mod lyrics;
pub mod token_cache;
pub mod token_manager;
pub mod totp;

use std::time::Duration;

pub use lyrics::{extract_track_id, LyricsClient, LyricsPayload};
pub use token_cache::{CredentialSet, FileTokenCache, MemoryTokenCache, TokenCache};
pub use token_manager::{RefreshPlan, TokenManager};
pub use totp::TotpSecret;

/// Browser user agent attached to every provider request.
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Transport-level ceiling on any single provider call.
const REQUEST_TIMEOUT_SECS: u64 = 600;

/// Build the HTTP client shared by the token manager and lyrics client.
///
/// # Errors
///
/// Returns [`lyriq_core::LyriqError::Network`] if the client cannot be
/// constructed.
pub fn build_http_client() -> lyriq_core::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;
    Ok(client)
}
