//! Environment-driven server configuration.

use std::env;
use std::path::PathBuf;

use lyriq_core::{LyriqError, Result};

/// Environment variable holding the provider session cookie value.
pub const SP_DC_ENV: &str = "SP_DC";

/// Environment variable overriding the listen address.
pub const BIND_ENV: &str = "LYRIQ_BIND";

/// Environment variable overriding the token cache location.
pub const TOKEN_CACHE_ENV: &str = "LYRIQ_TOKEN_CACHE";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Process configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Provider session cookie (`sp_dc`) authorizing the token handshake.
    pub sp_dc: String,
    /// Socket address to listen on.
    pub bind_addr: String,
    /// Location of the persisted token cache.
    pub token_cache_path: PathBuf,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LyriqError::ConfigMissing`] when `SP_DC` is absent or
    /// empty. This surfaces before any token work begins.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let sp_dc = lookup(SP_DC_ENV).unwrap_or_default();
        if sp_dc.is_empty() {
            return Err(LyriqError::ConfigMissing {
                field: SP_DC_ENV.to_string(),
            });
        }

        let bind_addr = lookup(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let token_cache_path = lookup(TOKEN_CACHE_ENV)
            .map_or_else(lyriq_core::paths::token_cache_path, PathBuf::from);

        Ok(Self {
            sp_dc,
            bind_addr,
            token_cache_path,
        })
    }
}
