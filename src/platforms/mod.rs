//! Ad-platform adapters.
//!
//! Each platform implements the same capability set behind [`AdPlatform`];
//! the quirks (Google's offline-access consent, Meta's long-lived token
//! exchange, unit conversions) live entirely inside the adapter so the sync
//! engine and credential lifecycle never branch on platform strings.

pub mod google;
pub mod meta;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::db::models::Credential;
use crate::error::AdmetraError;

pub use google::GoogleAdsAdapter;
pub use meta::MetaAdsAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Meta,
    Google,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Meta, Platform::Google];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Meta => "META",
            Platform::Google => "GOOGLE",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AdmetraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "META" => Ok(Platform::Meta),
            "GOOGLE" => Ok(Platform::Google),
            _ => Err(AdmetraError::NotFound("platform")),
        }
    }
}

/// Tokens returned by a code exchange or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds from "now".
    pub expires_in: i64,
    pub refresh_token: Option<String>,
}

impl TokenGrant {
    pub fn expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.expires_in)
    }
}

/// One day of one campaign's performance, platform-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMetricRow {
    pub campaign_id: String,
    pub date: NaiveDate,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: f64,
}

#[async_trait]
pub trait AdPlatform: Send + Sync {
    fn platform(&self) -> Platform;

    /// OAuth consent URL with the signed state embedded.
    fn build_authorize_url(&self, state: &str) -> Result<Url, AdmetraError>;

    /// Redeem an authorization code. The grant returned here is already
    /// stable: Meta chains its long-lived exchange internally.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AdmetraError>;

    /// Renew the credential's access token.
    async fn refresh(&self, credential: &Credential) -> Result<TokenGrant, AdmetraError>;

    /// Resolve the ad account reachable with this token; `None` means the
    /// authenticated identity has no linked ad accounts.
    async fn fetch_account_identifier(
        &self,
        access_token: &str,
    ) -> Result<Option<String>, AdmetraError>;

    /// Per-day, per-campaign metrics for the trailing sync window.
    async fn fetch_metrics(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<Vec<FetchedMetricRow>, AdmetraError>;
}

/// One adapter per platform, shared across the engines.
#[derive(Clone)]
pub struct AdapterSet {
    meta: Arc<dyn AdPlatform>,
    google: Arc<dyn AdPlatform>,
}

impl AdapterSet {
    pub fn new(meta: Arc<dyn AdPlatform>, google: Arc<dyn AdPlatform>) -> Self {
        Self { meta, google }
    }

    /// Real adapters wired from [`crate::config::CONFIG`].
    pub fn from_config(http: reqwest::Client) -> Result<Self, AdmetraError> {
        Ok(Self::new(
            Arc::new(MetaAdsAdapter::new(http.clone())),
            Arc::new(GoogleAdsAdapter::new(http)?),
        ))
    }

    pub fn for_platform(&self, platform: Platform) -> &dyn AdPlatform {
        match platform {
            Platform::Meta => self.meta.as_ref(),
            Platform::Google => self.google.as_ref(),
        }
    }
}

/// Numbers in platform payloads arrive as JSON numbers or quoted strings
/// depending on the field and API version; absent fields count as zero.
pub(crate) fn json_num(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Read a platform response, failing with the upstream body on non-2xx.
pub(crate) async fn read_platform_json(
    platform: Platform,
    resp: reqwest::Response,
) -> Result<Value, AdmetraError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(AdmetraError::PlatformApi {
            platform,
            status: Some(status.as_u16()),
            body,
        });
    }
    serde_json::from_str(&body).map_err(AdmetraError::from)
}
