//! Process configuration, loaded once from the environment.
//!
//! Nested sections use figment's `__` separator, e.g. `GOOGLE__CLIENT_ID`
//! maps to `google.client_id`. Secrets and OAuth app settings have no
//! defaults; startup fails loudly when they are missing.

use figment::Figment;
use figment::providers::Env;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

pub static GOOGLE_AUTH_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://accounts.google.com/o/oauth2/v2/auth").expect("static Google auth URL")
});

pub static GOOGLE_TOKEN_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://oauth2.googleapis.com/token").expect("static Google token URL")
});

pub const GOOGLE_ADS_BASE: &str = "https://googleads.googleapis.com/v18";
pub const GOOGLE_ADS_SCOPE: &str = "https://www.googleapis.com/auth/adwords";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Url,
    pub developer_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: Url,
    #[serde(default = "default_meta_api_version")]
    pub api_version: String,
    #[serde(default = "default_meta_scopes")]
    pub scopes: String,
}

impl MetaConfig {
    pub fn graph_base(&self) -> String {
        format!("https://graph.facebook.com/{}", self.api_version)
    }

    pub fn dialog_url(&self) -> String {
        format!("https://www.facebook.com/{}/dialog/oauth", self.api_version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    /// Shared secret protecting the scheduled-refresh endpoint.
    pub cron_secret: String,
    /// Base64-encoded 32-byte AES key for token encryption at rest.
    pub token_encryption_key: String,
    /// HMAC secret for the signed OAuth `state` parameter.
    pub oauth_state_secret: String,
    pub google: GoogleConfig,
    pub meta: MetaConfig,
}

fn default_database_url() -> String {
    "sqlite:admetra.sqlite".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_meta_api_version() -> String {
    "v19.0".to_string()
}

fn default_meta_scopes() -> String {
    "ads_read,ads_management,business_management".to_string()
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Figment::new()
        .merge(Env::raw().split("__"))
        .extract()
        .expect("FATAL: invalid or incomplete configuration")
});
