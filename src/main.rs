use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &admetra::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        bind_addr = %cfg.bind_addr,
        loglevel = %cfg.loglevel,
        "starting"
    );

    let pool = admetra::db::connect(&cfg.database_url).await?;
    let cipher = admetra::crypto::TokenCipher::from_base64(&cfg.token_encryption_key)?;

    let http = reqwest::Client::builder()
        .user_agent("admetra/0.3")
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build()?;
    let adapters = admetra::platforms::AdapterSet::from_config(http)?;

    let state = admetra::router::AppState::new(
        pool,
        adapters,
        cipher,
        cfg.oauth_state_secret.clone(),
        cfg.cron_secret.clone(),
    );
    let app = admetra::router::admetra_router(state);

    let listener = TcpListener::bind(&cfg.bind_addr).await?;
    info!("HTTP server listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
