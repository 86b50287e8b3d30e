//! Wire types for the provider's authentication endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response from the server-time endpoint.
#[derive(Debug, Deserialize)]
pub struct ServerTimeResponse {
    /// Server time in seconds since the Unix epoch.
    #[serde(rename = "serverTime")]
    pub server_time: u64,
}

/// Response from the access-token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for lyric requests.
    #[serde(rename = "accessToken")]
    pub access_token: String,

    /// Client identifier required for the client-token exchange.
    #[serde(rename = "clientId")]
    pub client_id: String,

    /// Absolute token expiry in milliseconds since the Unix epoch.
    #[serde(rename = "accessTokenExpirationTimestampMs")]
    pub access_token_expiration_timestamp_ms: i64,

    /// Whether the session resolved anonymously (indicates an invalid
    /// `sp_dc` cookie).
    #[serde(rename = "isAnonymous", default)]
    pub is_anonymous: bool,
}

/// Response from the client-token endpoint.
#[derive(Debug, Deserialize)]
pub struct ClientTokenResponse {
    pub granted_token: GrantedToken,
}

/// Granted client token with its provider-supplied lifetime.
#[derive(Debug, Deserialize)]
pub struct GrantedToken {
    pub token: String,
    /// Seconds until the token should be refreshed; expiry is computed as
    /// issue time plus this lifetime.
    pub refresh_after_seconds: i64,
}

/// Request payload for the client-token endpoint, identifying a synthetic
/// web-player device.
#[derive(Debug, Serialize)]
pub struct ClientTokenRequest {
    pub client_data: ClientData,
}

#[derive(Debug, Serialize)]
pub struct ClientData {
    pub client_version: String,
    pub client_id: String,
    pub js_sdk_data: JsSdkData,
}

#[derive(Debug, Serialize)]
pub struct JsSdkData {
    pub device_brand: String,
    pub device_model: String,
    pub os: String,
    pub os_version: String,
    pub device_id: String,
    pub device_type: String,
}

/// Web-player version string sent with the synthetic device identity.
const CLIENT_VERSION: &str = "1.2.46.25.g7f189073";

impl ClientTokenRequest {
    /// Build the exchange payload for `client_id` with a fresh random
    /// device UUID.
    #[must_use]
    pub fn for_client(client_id: &str) -> Self {
        Self {
            client_data: ClientData {
                client_version: CLIENT_VERSION.to_string(),
                client_id: client_id.to_string(),
                js_sdk_data: JsSdkData {
                    device_brand: "unknown".to_string(),
                    device_model: "unknown".to_string(),
                    os: "linux".to_string(),
                    os_version: "unknown".to_string(),
                    device_id: Uuid::new_v4().to_string(),
                    device_type: "computer".to_string(),
                },
            },
        }
    }
}
