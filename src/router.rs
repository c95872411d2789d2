//! Application state and route table.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::crypto::TokenCipher;
use crate::db::{ClientDirectory, CredentialStore, MetricsStore, SqlitePool};
use crate::handlers;
use crate::platforms::AdapterSet;
use crate::service::{Analytics, ConnectService, SyncEngine, TokenRefresher};

#[derive(Clone)]
pub struct AppState {
    pub connect: Arc<ConnectService>,
    pub sync: Arc<SyncEngine>,
    pub refresher: Arc<TokenRefresher>,
    pub analytics: Arc<Analytics>,
    pub clients: ClientDirectory,
    pub cron_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        adapters: AdapterSet,
        cipher: TokenCipher,
        state_secret: String,
        cron_secret: String,
    ) -> Self {
        let clients = ClientDirectory::new(pool.clone());
        let credentials = CredentialStore::new(pool.clone(), cipher);
        let metrics = MetricsStore::new(pool);

        Self {
            connect: Arc::new(ConnectService::new(
                clients.clone(),
                credentials.clone(),
                adapters.clone(),
                state_secret,
            )),
            sync: Arc::new(SyncEngine::new(
                clients.clone(),
                credentials.clone(),
                metrics.clone(),
                adapters.clone(),
            )),
            refresher: Arc::new(TokenRefresher::new(credentials, adapters)),
            analytics: Arc::new(Analytics::new(metrics)),
            clients,
            cron_secret: Arc::from(cron_secret),
        }
    }
}

pub fn admetra_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/integrations/{platform}/authorize",
            get(handlers::oauth::authorize),
        )
        .route(
            "/integrations/{platform}/callback",
            get(handlers::oauth::callback),
        )
        .route("/sync/clients/{id}", post(handlers::sync::sync_client))
        .route("/cron/refresh-tokens", post(handlers::refresh::refresh_tokens))
        .route("/analytics/summary", get(handlers::analytics::summary))
        .route(
            "/analytics/top-campaigns",
            get(handlers::analytics::top_campaigns),
        )
        .route(
            "/analytics/spend-trend",
            get(handlers::analytics::spend_trend),
        )
        .with_state(state)
}
