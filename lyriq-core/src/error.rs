use thiserror::Error;

/// Closed error taxonomy for the whole lyrics pipeline.
///
/// Every failure that can cross a component boundary is one of these kinds.
/// HTTP status codes are assigned by an explicit match at the request
/// boundary, never derived from error source identity.
#[derive(Debug, Error)]
pub enum LyriqError {
    /// A required configuration value is absent. Fatal at startup, before
    /// any token work begins.
    #[error("Missing required configuration: {field}")]
    ConfigMissing { field: String },

    /// Transport-level failure talking to the provider. Not retried.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered, but not in the shape we expect.
    #[error("Unexpected provider response: {reason}")]
    Protocol { reason: String },

    /// The provider resolved the session anonymously: the configured
    /// `sp_dc` cookie is invalid or expired. Terminal until the operator
    /// supplies a fresh value.
    #[error("The sp_dc cookie was rejected by the provider, please set a fresh value")]
    InvalidCredential,

    /// A token exchange step failed; wraps the first underlying failure.
    #[error("Token exchange failed: {source}")]
    TokenExchange {
        #[source]
        source: Box<LyriqError>,
    },

    /// The provider has no lyrics for this track. An expected business
    /// outcome, not a system failure.
    #[error("Lyrics for this track are not available: {track_id}")]
    LyricsNotFound { track_id: String },

    /// The token cache medium is not writable.
    #[error("Token cache storage failed: {0}")]
    Storage(std::io::Error),

    /// General I/O failure outside the token cache.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or parse JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LyriqError {
    /// Wrap a failure from one of the token exchange steps.
    ///
    /// [`LyriqError::InvalidCredential`] passes through unwrapped: it is a
    /// terminal operator-facing condition with its own status mapping, not
    /// a transient exchange failure.
    #[must_use]
    pub fn token_exchange(source: Self) -> Self {
        match source {
            Self::InvalidCredential => Self::InvalidCredential,
            other => Self::TokenExchange {
                source: Box::new(other),
            },
        }
    }
}

/// Convenience type alias for Results with [`LyriqError`].
pub type Result<T> = std::result::Result<T, LyriqError>;
