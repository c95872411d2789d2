//! Per-client metrics synchronization.

use serde::Serialize;
use tracing::{info, warn};

use crate::db::models::MetricRow;
use crate::db::{ClientDirectory, CredentialStore, MetricsStore};
use crate::error::AdmetraError;
use crate::platforms::{AdapterSet, Platform};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub client_id: String,
    pub meta_synced: u32,
    pub google_synced: u32,
}

pub struct SyncEngine {
    clients: ClientDirectory,
    credentials: CredentialStore,
    metrics: MetricsStore,
    adapters: AdapterSet,
}

impl SyncEngine {
    pub fn new(
        clients: ClientDirectory,
        credentials: CredentialStore,
        metrics: MetricsStore,
        adapters: AdapterSet,
    ) -> Self {
        Self {
            clients,
            credentials,
            metrics,
            adapters,
        }
    }

    /// Fetch and upsert the trailing window for every connected platform.
    /// A platform API failure is logged and counted as zero so the other
    /// platform still syncs; store failures propagate.
    pub async fn sync_client(&self, client_id: &str) -> Result<SyncSummary, AdmetraError> {
        if self.clients.get(client_id).await?.is_none() {
            return Err(AdmetraError::NotFound("client"));
        }

        let mut summary = SyncSummary {
            client_id: client_id.to_owned(),
            meta_synced: 0,
            google_synced: 0,
        };

        for platform in Platform::ALL {
            let synced = match self.sync_platform(client_id, platform).await {
                Ok(count) => count,
                Err(err @ (AdmetraError::PlatformApi { .. } | AdmetraError::Reqwest(_))) => {
                    warn!(client_id, %platform, error = %err, "platform sync failed; continuing");
                    0
                }
                Err(err) => return Err(err),
            };
            match platform {
                Platform::Meta => summary.meta_synced = synced,
                Platform::Google => summary.google_synced = synced,
            }
        }

        Ok(summary)
    }

    async fn sync_platform(
        &self,
        client_id: &str,
        platform: Platform,
    ) -> Result<u32, AdmetraError> {
        // Not being connected to a platform is the normal case, not an error.
        let Some(credential) = self.credentials.find(client_id, platform).await? else {
            return Ok(0);
        };
        if credential.access_token.is_empty() || credential.account_id.is_empty() {
            return Ok(0);
        }

        let rows = self
            .adapters
            .for_platform(platform)
            .fetch_metrics(&credential.access_token, &credential.account_id)
            .await?;

        let count = rows.len();
        for fetched in rows {
            self.metrics
                .upsert(&MetricRow::from_fetched(client_id, platform, fetched))
                .await?;
        }

        info!(client_id, %platform, count, "metrics synced");
        Ok(count as u32)
    }
}
