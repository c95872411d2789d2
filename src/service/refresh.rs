//! Horizon-based token refresh sweep, triggered by the cron endpoint.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::CredentialStore;
use crate::db::models::Credential;
use crate::error::AdmetraError;
use crate::platforms::{AdapterSet, Platform};

/// Meta tokens are long-lived and re-exchange is cheap, so refresh well
/// ahead of expiry; Google access tokens are short-lived by design and are
/// renewed just-in-time.
const META_HORIZON_DAYS: i64 = 7;
const GOOGLE_HORIZON_MINS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformRefreshCount {
    pub refreshed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub meta: PlatformRefreshCount,
    pub google: PlatformRefreshCount,
}

pub struct TokenRefresher {
    credentials: CredentialStore,
    adapters: AdapterSet,
}

impl TokenRefresher {
    pub fn new(credentials: CredentialStore, adapters: AdapterSet) -> Self {
        Self {
            credentials,
            adapters,
        }
    }

    /// One sweep over both platforms. Per-credential failures are logged and
    /// skipped; only store-level failures propagate. Re-selecting a
    /// credential across overlapping sweeps is harmless: refreshing an
    /// unexpired token just replaces it with a fresher one.
    pub async fn run_sweep(&self) -> Result<RefreshReport, AdmetraError> {
        let meta = self
            .refresh_platform(Platform::Meta, Duration::days(META_HORIZON_DAYS))
            .await?;
        let google = self
            .refresh_platform(Platform::Google, Duration::minutes(GOOGLE_HORIZON_MINS))
            .await?;

        info!(
            meta_refreshed = meta,
            google_refreshed = google,
            "token refresh sweep finished"
        );
        Ok(RefreshReport {
            meta: PlatformRefreshCount { refreshed: meta },
            google: PlatformRefreshCount { refreshed: google },
        })
    }

    async fn refresh_platform(
        &self,
        platform: Platform,
        horizon: Duration,
    ) -> Result<u32, AdmetraError> {
        let due = self
            .credentials
            .list_expiring(platform, Utc::now() + horizon)
            .await?;

        let mut refreshed = 0;
        for credential in &due {
            match self.refresh_one(credential).await {
                Ok(()) => refreshed += 1,
                Err(err) => {
                    warn!(
                        client_id = %credential.client_id,
                        %platform,
                        error = %err,
                        "token refresh failed; skipping credential"
                    );
                }
            }
        }
        Ok(refreshed)
    }

    async fn refresh_one(&self, credential: &Credential) -> Result<(), AdmetraError> {
        let grant = self
            .adapters
            .for_platform(credential.platform)
            .refresh(credential)
            .await?;

        // Platforms that return no new refresh token keep the stored one.
        let refresh_token = grant
            .refresh_token
            .clone()
            .or_else(|| credential.refresh_token.clone());

        self.credentials
            .update_tokens(
                &credential.client_id,
                credential.platform,
                &grant.access_token,
                refresh_token.as_deref(),
                grant.expiry(),
            )
            .await
    }
}
