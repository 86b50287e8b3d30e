//! Durable persistence of provider credentials.
//!
//! One process-wide slot holds both tokens and their expiries. Loads never
//! fail the caller: absent or corrupt state reads as an empty set. Saves
//! publish atomically (write-complete-then-rename) so a concurrent reader
//! never observes a partial write. Concurrent writers race
//! last-writer-wins.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lyriq_core::{LyriqError, Result};

/// Persisted credential material for the provider.
///
/// Usable for lyric requests only when both tokens are present and
/// strictly unexpired; partial states are valid intermediates during a
/// refresh, nothing more.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialSet {
    /// Bearer token for lyric requests.
    pub access_token: Option<String>,
    /// Client identifier returned alongside the access token.
    pub client_id: Option<String>,
    /// Absolute access-token expiry, milliseconds since the Unix epoch.
    pub access_token_expires_at_ms: i64,
    /// Secondary token required by the lyrics endpoint.
    pub client_token: Option<String>,
    /// Absolute client-token expiry, milliseconds since the Unix epoch.
    pub client_token_expires_at_ms: i64,
}

impl CredentialSet {
    #[must_use]
    pub fn has_valid_access_token(&self, now_ms: i64) -> bool {
        self.access_token.is_some() && self.access_token_expires_at_ms > now_ms
    }

    #[must_use]
    pub fn has_valid_client_token(&self, now_ms: i64) -> bool {
        self.client_token.is_some() && self.client_token_expires_at_ms > now_ms
    }

    /// Whether this set can authorize a lyrics request right now.
    #[must_use]
    pub fn is_usable(&self, now_ms: i64) -> bool {
        self.has_valid_access_token(now_ms) && self.has_valid_client_token(now_ms)
    }

    /// Merge in the result of an access-token exchange.
    ///
    /// Touches only the access-token fields; an in-flight client token is
    /// never clobbered.
    pub fn apply_access_grant(
        &mut self,
        access_token: String,
        client_id: String,
        expires_at_ms: i64,
    ) {
        self.access_token = Some(access_token);
        self.client_id = Some(client_id);
        self.access_token_expires_at_ms = expires_at_ms;
    }

    /// Merge in the result of a client-token exchange.
    ///
    /// Touches only the client-token fields; the access token and client
    /// ID are never clobbered.
    pub fn apply_client_grant(&mut self, client_token: String, expires_at_ms: i64) {
        self.client_token = Some(client_token);
        self.client_token_expires_at_ms = expires_at_ms;
    }
}

/// Durable load/save of a [`CredentialSet`].
///
/// An explicit abstraction owning its storage so the token manager can be
/// exercised against an in-memory double.
pub trait TokenCache: Send + Sync {
    /// Load the persisted credentials, or an empty set when no usable
    /// state exists. Never fails the caller.
    fn load(&self) -> CredentialSet;

    /// Fully overwrite the persisted credentials.
    ///
    /// # Errors
    ///
    /// Returns [`LyriqError::Storage`] if the backing medium is not
    /// writable.
    fn save(&self, credentials: &CredentialSet) -> Result<()>;
}

/// File-backed token cache at a fixed, process-wide location.
#[derive(Debug)]
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Cache at the default location (`~/.config/lyriq/token_cache.json`).
    #[must_use]
    pub fn at_default_path() -> Self {
        Self::new(lyriq_core::paths::token_cache_path())
    }
}

impl TokenCache for FileTokenCache {
    fn load(&self) -> CredentialSet {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(
                    "Token cache at {} is unreadable ({e}), starting from an empty set",
                    self.path.display()
                );
                CredentialSet::default()
            }),
            Err(e) => {
                debug!(
                    "No token cache at {} ({e}), starting from an empty set",
                    self.path.display()
                );
                CredentialSet::default()
            }
        }
    }

    fn save(&self, credentials: &CredentialSet) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(LyriqError::Storage)?;
        }
        let json = serde_json::to_string_pretty(credentials)?;

        // Write-complete-then-publish: a concurrent reader sees either the
        // previous file or the new one, never a torn write.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(LyriqError::Storage)?;
        fs::rename(&staging, &self.path).map_err(LyriqError::Storage)?;
        Ok(())
    }
}

/// In-memory token cache for tests and cacheless deployments.
#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    slot: Mutex<CredentialSet>,
}

impl MemoryTokenCache {
    #[must_use]
    pub fn new(credentials: CredentialSet) -> Self {
        Self {
            slot: Mutex::new(credentials),
        }
    }
}

impl TokenCache for MemoryTokenCache {
    fn load(&self) -> CredentialSet {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, credentials: &CredentialSet) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = credentials.clone();
        Ok(())
    }
}
