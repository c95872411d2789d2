//! Meta (Facebook) Ads adapter.
//!
//! Meta's token model has no refresh token: a short-lived code-exchange token
//! is immediately traded for a long-lived one, and renewal re-runs that same
//! exchange on the current token. The `fb_exchange_token` grant is not
//! standard OAuth, so this adapter speaks the Graph API directly.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use url::Url;

use super::{AdPlatform, FetchedMetricRow, Platform, TokenGrant, json_num, read_platform_json};
use crate::config::CONFIG;
use crate::db::models::Credential;
use crate::error::AdmetraError;

// Long-lived tokens are ~60 days; used when the exchange omits expires_in.
const LONG_LIVED_FALLBACK_SECS: i64 = 60 * 24 * 60 * 60;

pub struct MetaAdsAdapter {
    http: reqwest::Client,
    app_id: String,
    app_secret: String,
    redirect_uri: Url,
    graph_base: String,
    dialog_url: String,
    scopes: String,
}

impl MetaAdsAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        let meta = &CONFIG.meta;
        Self {
            http,
            app_id: meta.app_id.clone(),
            app_secret: meta.app_secret.clone(),
            redirect_uri: meta.redirect_uri.clone(),
            graph_base: meta.graph_base(),
            dialog_url: meta.dialog_url(),
            scopes: meta.scopes.clone(),
        }
    }

    async fn oauth_access_token(&self, params: &[(&str, &str)]) -> Result<TokenGrant, AdmetraError> {
        let resp = self
            .http
            .get(format!("{}/oauth/access_token", self.graph_base))
            .query(params)
            .send()
            .await?;
        let payload = read_platform_json(Platform::Meta, resp).await?;

        let access_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AdmetraError::PlatformApi {
                platform: Platform::Meta,
                status: None,
                body: payload.to_string(),
            })?
            .to_owned();
        let expires_in = json_num(payload.get("expires_in")) as i64;

        Ok(TokenGrant {
            access_token,
            expires_in: if expires_in > 0 {
                expires_in
            } else {
                LONG_LIVED_FALLBACK_SECS
            },
            refresh_token: None,
        })
    }

    async fn exchange_long_lived(&self, access_token: &str) -> Result<TokenGrant, AdmetraError> {
        self.oauth_access_token(&[
            ("grant_type", "fb_exchange_token"),
            ("client_id", &self.app_id),
            ("client_secret", &self.app_secret),
            ("fb_exchange_token", access_token),
        ])
        .await
    }
}

#[async_trait]
impl AdPlatform for MetaAdsAdapter {
    fn platform(&self) -> Platform {
        Platform::Meta
    }

    fn build_authorize_url(&self, state: &str) -> Result<Url, AdmetraError> {
        let mut url = Url::parse(&self.dialog_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.app_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("state", state)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AdmetraError> {
        // The code yields a 1-2 hour token; without the chained long-lived
        // exchange the credential would expire before the first sweep.
        let short_lived = self
            .oauth_access_token(&[
                ("client_id", &self.app_id),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_secret", &self.app_secret),
                ("code", code),
            ])
            .await?;
        self.exchange_long_lived(&short_lived.access_token).await
    }

    async fn refresh(&self, credential: &Credential) -> Result<TokenGrant, AdmetraError> {
        if credential.access_token.is_empty() {
            return Err(AdmetraError::MissingAccessToken);
        }
        self.exchange_long_lived(&credential.access_token).await
    }

    async fn fetch_account_identifier(
        &self,
        access_token: &str,
    ) -> Result<Option<String>, AdmetraError> {
        let resp = self
            .http
            .get(format!("{}/me/adaccounts", self.graph_base))
            .query(&[("fields", "account_id"), ("access_token", access_token)])
            .send()
            .await?;
        let payload = read_platform_json(Platform::Meta, resp).await?;

        Ok(payload
            .pointer("/data/0/account_id")
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    async fn fetch_metrics(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<Vec<FetchedMetricRow>, AdmetraError> {
        let resp = self
            .http
            .get(format!("{}/act_{}/insights", self.graph_base, account_id))
            .query(&[
                ("fields", "campaign_id,spend,impressions,clicks,actions,date_start"),
                ("time_increment", "1"),
                ("date_preset", "last_7d"),
                ("access_token", access_token),
            ])
            .send()
            .await?;
        let payload = read_platform_json(Platform::Meta, resp).await?;
        Ok(rows_from_insights(&payload))
    }
}

/// Normalize an insights response. Meta has no single conversions field; the
/// heterogeneous `actions` list is reduced by summing every action's value.
pub(crate) fn rows_from_insights(payload: &Value) -> Vec<FetchedMetricRow> {
    let Some(data) = payload.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    data.iter()
        .filter_map(|row| {
            let campaign_id = row.get("campaign_id").and_then(Value::as_str)?;
            if campaign_id.is_empty() {
                return None;
            }
            let date = row
                .get("date_start")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?;

            let conversions = row
                .get("actions")
                .and_then(Value::as_array)
                .map_or(0.0, |actions| {
                    actions.iter().map(|action| json_num(action.get("value"))).sum()
                });

            Some(FetchedMetricRow {
                campaign_id: campaign_id.to_owned(),
                date,
                spend: json_num(row.get("spend")),
                impressions: json_num(row.get("impressions")) as i64,
                clicks: json_num(row.get("clicks")) as i64,
                conversions,
            })
        })
        .collect()
}
