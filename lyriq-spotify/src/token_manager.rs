//! Token lifecycle management for the provider handshake.
//!
//! This module owns the complete refresh-or-reuse flow:
//! 1. Load cached credentials
//! 2. If the access token is stale: fetch server time, derive a TOTP code,
//!    and exchange `sp_dc` + TOTP for a fresh access token
//! 3. If the client token is stale: exchange the client ID and a synthetic
//!    device identity for a fresh client token
//! 4. Persist the merged credential set
//!
//! The two tokens have independent lifetimes and failure domains (one is
//! keyed by the user cookie + TOTP, the other by client identity), so each
//! is refreshed only when its own expiry has passed.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use lyriq_core::{LyriqError, Result};

use crate::auth::{ClientTokenRequest, ClientTokenResponse, ServerTimeResponse, TokenResponse};
use crate::token_cache::{CredentialSet, TokenCache};
use crate::totp::{generate_totp, TotpSecret};
use crate::USER_AGENT;

/// URL for fetching the provider's canonical clock value.
const SERVER_TIME_URL: &str = "https://open.spotify.com/server-time";

/// URL for the access-token exchange.
const TOKEN_URL: &str = "https://open.spotify.com/get_access_token";

/// URL for the client-token exchange.
const CLIENT_TOKEN_URL: &str = "https://clienttoken.spotify.com/v1/clienttoken";

/// Which exchanges a credential set needs at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPlan {
    pub access_token: bool,
    pub client_token: bool,
}

impl RefreshPlan {
    /// Decide which exchanges are required for `credentials` at `now_ms`.
    #[must_use]
    pub fn for_credentials(credentials: &CredentialSet, now_ms: i64) -> Self {
        Self {
            access_token: !credentials.has_valid_access_token(now_ms),
            client_token: !credentials.has_valid_client_token(now_ms),
        }
    }

    /// True when both tokens are still valid and no network call is needed.
    #[must_use]
    pub const fn is_noop(self) -> bool {
        !self.access_token && !self.client_token
    }
}

/// Manages the provider credential lifecycle against an injected cache.
pub struct TokenManager {
    sp_dc: String,
    secret: TotpSecret,
    client: reqwest::Client,
    cache: Box<dyn TokenCache>,
}

impl TokenManager {
    /// Create a new token manager.
    ///
    /// # Arguments
    ///
    /// * `sp_dc` - The provider session cookie value
    /// * `secret` - TOTP secret material (see [`TotpSecret::default`])
    /// * `client` - HTTP client for the handshake requests
    /// * `cache` - Durable store for the credential set
    #[must_use]
    pub fn new(
        sp_dc: impl Into<String>,
        secret: TotpSecret,
        client: reqwest::Client,
        cache: Box<dyn TokenCache>,
    ) -> Self {
        Self {
            sp_dc: sp_dc.into(),
            secret,
            client,
            cache,
        }
    }

    /// Return a credential set with both tokens valid, refreshing whichever
    /// expired. A pure cache hit performs no network calls.
    ///
    /// # Errors
    ///
    /// Returns [`LyriqError::InvalidCredential`] when the provider resolves
    /// the session anonymously, or [`LyriqError::TokenExchange`] wrapping
    /// the first network/protocol failure from either exchange.
    pub async fn ensure_valid_tokens(&self) -> Result<CredentialSet> {
        let mut credentials = self.cache.load();
        let plan = RefreshPlan::for_credentials(&credentials, unix_time_ms());

        if plan.is_noop() {
            debug!("Using cached provider credentials");
            return Ok(credentials);
        }

        if plan.access_token {
            self.exchange_access_token(&mut credentials).await?;
        }

        // A first run has no client ID until the access-token exchange has
        // answered, so the check runs against the merged set.
        if plan.client_token && credentials.client_id.is_some() {
            self.exchange_client_token(&mut credentials).await?;
        }

        Ok(credentials)
    }

    /// Perform the access-token exchange and merge the result.
    async fn exchange_access_token(&self, credentials: &mut CredentialSet) -> Result<()> {
        info!("Refreshing access token via TOTP handshake");

        let server_time = self.fetch_server_time().await?;
        debug!("Provider server time: {server_time}");

        let totp = generate_totp(self.secret.key(), server_time).map_err(|e| {
            LyriqError::token_exchange(LyriqError::Protocol {
                reason: e.to_string(),
            })
        })?;

        let token = self.fetch_access_token(&totp, server_time).await?;
        credentials.apply_access_grant(
            token.access_token,
            token.client_id,
            token.access_token_expiration_timestamp_ms,
        );
        self.persist(credentials);

        info!("Access token refreshed");
        Ok(())
    }

    /// Fetch the provider's canonical clock value. Single attempt, no
    /// retries.
    async fn fetch_server_time(&self) -> Result<u64> {
        let response = self
            .client
            .get(SERVER_TIME_URL)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| LyriqError::token_exchange(e.into()))?;

        let body: ServerTimeResponse = response.json().await.map_err(|e| {
            LyriqError::token_exchange(LyriqError::Protocol {
                reason: format!("server-time response: {e}"),
            })
        })?;

        Ok(body.server_time)
    }

    /// Exchange the session cookie and TOTP code for an access token.
    async fn fetch_access_token(&self, totp: &str, server_time_seconds: u64) -> Result<TokenResponse> {
        let ts = server_time_seconds.saturating_mul(1000);
        let url = format!(
            "{TOKEN_URL}?reason=transport&productType=web_player&totp={totp}&totpVer={version}&ts={ts}",
            version = self.secret.version()
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("App-Platform", "WebPlayer")
            .header("Cookie", format!("sp_dc={}", self.sp_dc))
            .send()
            .await
            .map_err(|e| LyriqError::token_exchange(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(LyriqError::token_exchange(LyriqError::Protocol {
                reason: format!("token endpoint returned HTTP {status}"),
            }));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            LyriqError::token_exchange(LyriqError::Protocol {
                reason: format!("token response: {e}"),
            })
        })?;

        if token.is_anonymous {
            warn!("Provider resolved the session anonymously; sp_dc is invalid or expired");
            return Err(LyriqError::InvalidCredential);
        }

        Ok(token)
    }

    /// Perform the client-token exchange and merge the result.
    async fn exchange_client_token(&self, credentials: &mut CredentialSet) -> Result<()> {
        let Some(client_id) = credentials.client_id.clone() else {
            return Ok(());
        };
        info!("Refreshing client token");

        let request = ClientTokenRequest::for_client(&client_id);
        let response = self
            .client
            .post(CLIENT_TOKEN_URL)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LyriqError::token_exchange(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(LyriqError::token_exchange(LyriqError::Protocol {
                reason: format!("client-token endpoint returned HTTP {status}"),
            }));
        }

        let granted: ClientTokenResponse = response.json().await.map_err(|e| {
            LyriqError::token_exchange(LyriqError::Protocol {
                reason: format!("client-token response: {e}"),
            })
        })?;

        let expires_at_ms = unix_time_ms()
            .saturating_add(granted.granted_token.refresh_after_seconds.saturating_mul(1000));
        credentials.apply_client_grant(granted.granted_token.token, expires_at_ms);
        self.persist(credentials);

        info!("Client token refreshed");
        Ok(())
    }

    /// Persist the merged set. A failed save is logged; the in-memory
    /// credentials still serve this request.
    fn persist(&self, credentials: &CredentialSet) {
        if let Err(e) = self.cache.save(credentials) {
            warn!("Failed to persist token cache: {e}");
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
fn unix_time_ms() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_cache::MemoryTokenCache;

    fn credentials(access_expires_at_ms: i64, client_expires_at_ms: i64) -> CredentialSet {
        CredentialSet {
            access_token: Some("at".to_string()),
            client_id: Some("cid".to_string()),
            access_token_expires_at_ms: access_expires_at_ms,
            client_token: Some("ct".to_string()),
            client_token_expires_at_ms: client_expires_at_ms,
        }
    }

    #[test]
    fn test_plan_noop_when_both_valid() {
        let plan = RefreshPlan::for_credentials(&credentials(2_000, 2_000), 1_000);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_plan_refreshes_only_the_stale_access_token() {
        let plan = RefreshPlan::for_credentials(&credentials(500, 2_000), 1_000);
        assert_eq!(
            plan,
            RefreshPlan {
                access_token: true,
                client_token: false,
            }
        );
    }

    #[test]
    fn test_plan_refreshes_only_the_stale_client_token() {
        let plan = RefreshPlan::for_credentials(&credentials(2_000, 500), 1_000);
        assert_eq!(
            plan,
            RefreshPlan {
                access_token: false,
                client_token: true,
            }
        );
    }

    #[test]
    fn test_plan_refreshes_both_when_both_stale() {
        let plan = RefreshPlan::for_credentials(&credentials(500, 500), 1_000);
        assert_eq!(
            plan,
            RefreshPlan {
                access_token: true,
                client_token: true,
            }
        );
    }

    #[test]
    fn test_plan_treats_missing_tokens_as_stale() {
        let plan = RefreshPlan::for_credentials(&CredentialSet::default(), 0);
        assert!(plan.access_token);
        assert!(plan.client_token);
    }

    #[tokio::test]
    async fn test_ensure_valid_tokens_is_a_pure_cache_hit() {
        // Both tokens valid far into the future: the manager must return
        // the cached set without touching the network.
        let cached = credentials(i64::MAX, i64::MAX);
        let manager = TokenManager::new(
            "cookie",
            TotpSecret::default(),
            reqwest::Client::new(),
            Box::new(MemoryTokenCache::new(cached.clone())),
        );

        let resolved = manager
            .ensure_valid_tokens()
            .await
            .expect("cache hit should not fail");
        assert_eq!(resolved, cached);
    }
}
