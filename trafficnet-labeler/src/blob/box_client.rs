//! Box.com blob storage client
//!
//! Authenticates as an app user via the client-credentials grant
//! (`box_subject_type=user`) and downloads file content by file id.
//! Credentials come from the app's JSON config, base64-encoded so it fits
//! in one environment variable.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{BlobError, BlobStore};

const BOX_API_BASE_URL: &str = "https://api.box.com";
const USER_AGENT: &str = concat!("TrafficNet-Labeler/", env!("CARGO_PKG_VERSION"));
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Decoded Box app configuration (the JSON downloaded from the developer console)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxAppConfig {
    pub box_app_settings: BoxAppSettings,
    #[serde(rename = "enterpriseID", default)]
    pub enterprise_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxAppSettings {
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

impl BoxAppConfig {
    /// Decode the base64-encoded JSON app config
    pub fn from_base64(encoded: &str) -> Result<Self, BlobError> {
        let json = STANDARD
            .decode(encoded.trim())
            .map_err(|e| BlobError::Config(format!("config is not base64: {}", e)))?;
        serde_json::from_slice(&json)
            .map_err(|e| BlobError::Config(format!("config is not a Box app config: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Box.com content API client
pub struct BoxBlobStore {
    http_client: reqwest::Client,
    config: BoxAppConfig,
    user_id: String,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl BoxBlobStore {
    pub fn new(config: BoxAppConfig, user_id: impl Into<String>) -> Result<Self, BlobError> {
        Self::with_base_url(config, user_id, BOX_API_BASE_URL)
    }

    /// Point the client at a different API host
    pub fn with_base_url(
        config: BoxAppConfig,
        user_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, BlobError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BlobError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            user_id: user_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Current access token, exchanging credentials when missing or near expiry
    async fn access_token(&self) -> Result<String, BlobError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/oauth2/token", self.base_url);
        debug!(url = %url, "Requesting Box access token");

        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.box_app_settings.client_id.as_str()),
                ("client_secret", self.config.box_app_settings.client_secret.as_str()),
                ("box_subject_type", "user"),
                ("box_subject_id", self.user_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BlobError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BlobError::Auth(format!("{}: {}", status.as_u16(), error_text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BlobError::Auth(format!("unreadable token response: {}", e)))?;

        info!(expires_in = token.expires_in, "Box client authenticated");

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }

    async fn clear_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl BlobStore for BoxBlobStore {
    async fn fetch(&self, blob_id: &str) -> Result<Vec<u8>, BlobError> {
        // Box file ids are numeric; anything else cannot name a file
        if blob_id.is_empty() || !blob_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BlobError::NotFound(blob_id.to_string()));
        }

        let token = self.access_token().await?;
        let url = format!("{}/2.0/files/{}/content", self.base_url, blob_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BlobError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound(blob_id.to_string()));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!(blob_id = %blob_id, "Box rejected access token, dropping cached token");
            self.clear_token().await;
            return Err(BlobError::Auth("access token rejected".to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BlobError::Api(status.as_u16(), error_text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BlobError::Network(e.to_string()))?;

        debug!(blob_id = %blob_id, bytes = bytes.len(), "Downloaded blob from Box");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "box"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_CONFIG: &str = r#"{
        "boxAppSettings": {
            "clientID": "client-abc",
            "clientSecret": "secret-xyz",
            "appAuth": {"publicKeyID": "", "privateKey": "", "passphrase": ""}
        },
        "enterpriseID": "12345"
    }"#;

    #[test]
    fn decodes_base64_app_config() {
        let encoded = STANDARD.encode(APP_CONFIG);
        let config = BoxAppConfig::from_base64(&format!("{}\n", encoded)).unwrap();
        assert_eq!(config.box_app_settings.client_id, "client-abc");
        assert_eq!(config.box_app_settings.client_secret, "secret-xyz");
        assert_eq!(config.enterprise_id.as_deref(), Some("12345"));
    }

    #[test]
    fn rejects_non_base64_config() {
        assert!(matches!(
            BoxAppConfig::from_base64("not base64!!"),
            Err(BlobError::Config(_))
        ));
    }

    #[test]
    fn rejects_unrelated_json() {
        let encoded = STANDARD.encode(r#"{"hello": "world"}"#);
        assert!(matches!(BoxAppConfig::from_base64(&encoded), Err(BlobError::Config(_))));
    }

    #[tokio::test]
    async fn rejects_non_numeric_ids_without_network() {
        let config: BoxAppConfig = serde_json::from_str(APP_CONFIG).unwrap();
        let store = BoxBlobStore::with_base_url(config, "42", "http://127.0.0.1:9").unwrap();
        assert!(matches!(store.fetch("../etc").await, Err(BlobError::NotFound(_))));
    }
}
