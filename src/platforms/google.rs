//! Google Ads adapter.
//!
//! Token plumbing goes through the `oauth2` crate; the Ads API itself
//! (account listing, GAQL searchStream) is plain REST. Costs arrive in
//! micro-units of the account currency.

use async_trait::async_trait;
use chrono::NaiveDate;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenResponse,
};
use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, Scope, StandardRevocableToken,
    TokenResponse, TokenUrl,
};
use serde_json::Value;
use url::Url;

use super::{AdPlatform, FetchedMetricRow, Platform, TokenGrant, json_num, read_platform_json};
use crate::config::{CONFIG, GOOGLE_ADS_BASE, GOOGLE_ADS_SCOPE, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL};
use crate::db::models::Credential;
use crate::error::AdmetraError;

type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

// Day granularity comes from segments.date; the API bounds the window.
const METRICS_QUERY: &str = "\
    SELECT campaign.id, segments.date, metrics.impressions, metrics.clicks, \
           metrics.cost_micros, metrics.conversions \
    FROM campaign WHERE segments.date DURING LAST_7_DAYS";

const MICROS_PER_UNIT: f64 = 1_000_000.0;

// Google omits expires_in only in degenerate responses; access tokens are
// otherwise one hour.
const DEFAULT_EXPIRES_SECS: i64 = 3600;

pub struct GoogleAdsAdapter {
    http: reqwest::Client,
    developer_token: String,
    oauth: GoogleOauth2Client,
}

impl GoogleAdsAdapter {
    pub fn new(http: reqwest::Client) -> Result<Self, AdmetraError> {
        let google = &CONFIG.google;
        let oauth = OAuth2Client::new(ClientId::new(google.client_id.clone()))
            .set_client_secret(ClientSecret::new(google.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.as_str().to_string())?)
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.as_str().to_string())?)
            .set_redirect_uri(RedirectUrl::new(google.redirect_uri.as_str().to_string())?);

        Ok(Self {
            http,
            developer_token: google.developer_token.clone(),
            oauth,
        })
    }
}

fn grant_from(token: BasicTokenResponse) -> TokenGrant {
    TokenGrant {
        access_token: token.access_token().secret().clone(),
        expires_in: token
            .expires_in()
            .map_or(DEFAULT_EXPIRES_SECS, |d| d.as_secs() as i64),
        refresh_token: token.refresh_token().map(|t| t.secret().clone()),
    }
}

#[async_trait]
impl AdPlatform for GoogleAdsAdapter {
    fn platform(&self) -> Platform {
        Platform::Google
    }

    fn build_authorize_url(&self, state: &str) -> Result<Url, AdmetraError> {
        // offline access + forced consent so the first exchange yields a
        // refresh token; later exchanges may legitimately omit it.
        let (url, _csrf) = self
            .oauth
            .authorize_url(|| CsrfToken::new(state.to_owned()))
            .add_scope(Scope::new(GOOGLE_ADS_SCOPE.to_owned()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .add_extra_param("include_granted_scopes", "true")
            .url();
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AdmetraError> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .request_async(&self.http)
            .await?;
        Ok(grant_from(token))
    }

    async fn refresh(&self, credential: &Credential) -> Result<TokenGrant, AdmetraError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or(AdmetraError::MissingRefreshToken)?;
        let token = self
            .oauth
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_owned()))
            .request_async(&self.http)
            .await?;
        Ok(grant_from(token))
    }

    async fn fetch_account_identifier(
        &self,
        access_token: &str,
    ) -> Result<Option<String>, AdmetraError> {
        let resp = self
            .http
            .get(format!("{GOOGLE_ADS_BASE}/customers:listAccessibleCustomers"))
            .bearer_auth(access_token)
            .header("developer-token", &self.developer_token)
            .send()
            .await?;
        let payload = read_platform_json(Platform::Google, resp).await?;

        // "customers/1234567890" -> "1234567890"
        Ok(payload
            .get("resourceNames")
            .and_then(Value::as_array)
            .and_then(|names| names.first())
            .and_then(Value::as_str)
            .and_then(|name| name.split('/').nth(1))
            .map(str::to_owned))
    }

    async fn fetch_metrics(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<Vec<FetchedMetricRow>, AdmetraError> {
        let resp = self
            .http
            .post(format!(
                "{GOOGLE_ADS_BASE}/customers/{account_id}/googleAds:searchStream"
            ))
            .bearer_auth(access_token)
            .header("developer-token", &self.developer_token)
            .json(&serde_json::json!({ "query": METRICS_QUERY }))
            .send()
            .await?;
        let payload = read_platform_json(Platform::Google, resp).await?;
        Ok(rows_from_search_stream(&payload))
    }
}

/// Normalize a searchStream response (an array of result chunks). Rows
/// without a campaign id or parseable date are dropped; int64 metrics arrive
/// as JSON strings.
pub(crate) fn rows_from_search_stream(payload: &Value) -> Vec<FetchedMetricRow> {
    let mut rows = Vec::new();
    let Some(chunks) = payload.as_array() else {
        return rows;
    };

    for chunk in chunks {
        let Some(results) = chunk.get("results").and_then(Value::as_array) else {
            continue;
        };
        for result in results {
            let campaign_id = match result.pointer("/campaign/id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            if campaign_id.is_empty() {
                continue;
            }
            let Some(date) = result
                .pointer("/segments/date")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                continue;
            };

            let metrics = result.get("metrics");
            let field = |name: &str| json_num(metrics.and_then(|m| m.get(name)));

            rows.push(FetchedMetricRow {
                campaign_id,
                date,
                spend: field("costMicros") / MICROS_PER_UNIT,
                impressions: field("impressions") as i64,
                clicks: field("clicks") as i64,
                conversions: field("conversions"),
            });
        }
    }

    rows
}
