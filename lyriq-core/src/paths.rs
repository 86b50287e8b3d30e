//! Path constants for configuration and the token cache.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "lyriq";

/// The name of the persisted token cache file
pub const TOKEN_CACHE_FILE_NAME: &str = "token_cache.json";

/// Get the configuration directory path (~/.config/lyriq/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the default token cache path (`~/.config/lyriq/token_cache.json`)
#[must_use]
pub fn token_cache_path() -> PathBuf {
    config_dir().join(TOKEN_CACHE_FILE_NAME)
}
