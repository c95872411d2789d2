#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use url::Url;

use admetra::crypto::TokenCipher;
use admetra::db::models::{Client, Credential, MetricRow};
use admetra::db::{self, ClientDirectory, CredentialStore, MetricsStore, SqlitePool};
use admetra::error::AdmetraError;
use admetra::platforms::{AdPlatform, AdapterSet, FetchedMetricRow, Platform, TokenGrant};

/// Temp-file SQLite database, removed on drop.
pub struct TestDb {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub async fn test_db(tag: &str) -> TestDb {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "admetra-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let pool = db::connect(&format!("sqlite:{}", path.display()))
        .await
        .expect("failed to open test database");
    TestDb { pool, path }
}

pub fn test_cipher() -> TokenCipher {
    TokenCipher::from_base64(&STANDARD.encode([9u8; 32])).expect("test cipher key")
}

pub fn credential_store(pool: &SqlitePool) -> CredentialStore {
    CredentialStore::new(pool.clone(), test_cipher())
}

pub async fn seed_client(pool: &SqlitePool, id: &str, agency_id: &str) {
    ClientDirectory::new(pool.clone())
        .upsert(&Client {
            id: id.to_string(),
            agency_id: agency_id.to_string(),
            name: format!("client {id}"),
        })
        .await
        .expect("seed client");
}

pub async fn seed_credential(
    pool: &SqlitePool,
    client_id: &str,
    platform: Platform,
    refresh_token: Option<&str>,
    token_expiry: DateTime<Utc>,
) {
    credential_store(pool)
        .upsert(Credential {
            client_id: client_id.to_string(),
            platform,
            account_id: format!("acct-{client_id}"),
            access_token: format!("access-{client_id}-{platform}"),
            refresh_token: refresh_token.map(str::to_owned),
            token_expiry,
        })
        .await
        .expect("seed credential");
}

pub async fn seed_metric(
    pool: &SqlitePool,
    client_id: &str,
    platform: Platform,
    campaign_id: &str,
    date: NaiveDate,
    spend: f64,
) {
    MetricsStore::new(pool.clone())
        .upsert(&MetricRow {
            client_id: client_id.to_string(),
            platform,
            campaign_id: campaign_id.to_string(),
            date,
            spend,
            impressions: 0,
            clicks: 0,
            conversions: 0.0,
        })
        .await
        .expect("seed metric");
}

pub async fn count_metrics(pool: &SqlitePool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM campaign_metrics")
        .fetch_one(pool)
        .await
        .expect("count metrics");
    count
}

pub fn days_ago(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

pub fn fetched_row(campaign_id: &str, date: NaiveDate, spend: f64) -> FetchedMetricRow {
    FetchedMetricRow {
        campaign_id: campaign_id.to_string(),
        date,
        spend,
        impressions: 100,
        clicks: 10,
        conversions: 1.0,
    }
}

pub fn platform_error(platform: Platform) -> AdmetraError {
    AdmetraError::PlatformApi {
        platform,
        status: Some(500),
        body: "stub upstream failure".to_string(),
    }
}

/// Canned adapter standing in for a real platform API.
pub struct StubAdapter {
    pub platform: Platform,
    pub grant: TokenGrant,
    pub account: Option<String>,
    pub rows: Vec<FetchedMetricRow>,
    pub fail_fetch: bool,
    pub fail_refresh: bool,
}

impl StubAdapter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            grant: TokenGrant {
                access_token: format!("fresh-access-{platform}"),
                expires_in: 3600,
                refresh_token: None,
            },
            account: Some("acct-stub".to_string()),
            rows: Vec::new(),
            fail_fetch: false,
            fail_refresh: false,
        }
    }

    pub fn with_rows(mut self, rows: Vec<FetchedMetricRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn with_grant(mut self, grant: TokenGrant) -> Self {
        self.grant = grant;
        self
    }

    pub fn without_account(mut self) -> Self {
        self.account = None;
        self
    }
}

#[async_trait]
impl AdPlatform for StubAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn build_authorize_url(&self, state: &str) -> Result<Url, AdmetraError> {
        Url::parse(&format!("https://consent.example/auth?state={state}")).map_err(Into::into)
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenGrant, AdmetraError> {
        Ok(self.grant.clone())
    }

    async fn refresh(&self, _credential: &Credential) -> Result<TokenGrant, AdmetraError> {
        if self.fail_refresh {
            return Err(platform_error(self.platform));
        }
        Ok(self.grant.clone())
    }

    async fn fetch_account_identifier(
        &self,
        _access_token: &str,
    ) -> Result<Option<String>, AdmetraError> {
        Ok(self.account.clone())
    }

    async fn fetch_metrics(
        &self,
        _access_token: &str,
        _account_id: &str,
    ) -> Result<Vec<FetchedMetricRow>, AdmetraError> {
        if self.fail_fetch {
            return Err(platform_error(self.platform));
        }
        Ok(self.rows.clone())
    }
}

pub fn adapter_set(meta: StubAdapter, google: StubAdapter) -> AdapterSet {
    AdapterSet::new(Arc::new(meta), Arc::new(google))
}
