mod common;

use chrono::{Duration, Utc};

use admetra::db::{ClientDirectory, MetricsStore, SqlitePool};
use admetra::error::AdmetraError;
use admetra::platforms::Platform;
use admetra::service::SyncEngine;

use common::{
    StubAdapter, adapter_set, count_metrics, credential_store, days_ago, fetched_row, seed_client,
    seed_credential, test_db,
};

fn engine(pool: &SqlitePool, meta: StubAdapter, google: StubAdapter) -> SyncEngine {
    SyncEngine::new(
        ClientDirectory::new(pool.clone()),
        credential_store(pool),
        MetricsStore::new(pool.clone()),
        adapter_set(meta, google),
    )
}

#[tokio::test]
async fn sync_is_idempotent_across_reruns() {
    let db = test_db("sync-idempotent").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    seed_credential(
        &db.pool,
        "c1",
        Platform::Google,
        Some("refresh-1"),
        Utc::now() + Duration::hours(1),
    )
    .await;

    let rows = vec![
        fetched_row("camp-1", days_ago(1), 10.0),
        fetched_row("camp-2", days_ago(2), 20.0),
    ];

    let engine = engine(
        &db.pool,
        StubAdapter::new(Platform::Meta),
        StubAdapter::new(Platform::Google).with_rows(rows.clone()),
    );

    let first = engine.sync_client("c1").await.expect("first sync");
    assert_eq!(first.google_synced, 2);
    assert_eq!(first.meta_synced, 0);
    assert_eq!(count_metrics(&db.pool).await, 2);

    let second = engine.sync_client("c1").await.expect("second sync");
    assert_eq!(second, first);
    assert_eq!(count_metrics(&db.pool).await, 2);

    let (spend,): (f64,) = sqlx::query_as(
        "SELECT spend FROM campaign_metrics WHERE campaign_id = 'camp-1'",
    )
    .fetch_one(&db.pool)
    .await
    .expect("spend");
    assert_eq!(spend, 10.0);
}

#[tokio::test]
async fn rerun_overwrites_with_latest_values_on_the_natural_key() {
    let db = test_db("sync-overwrite").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    seed_credential(
        &db.pool,
        "c1",
        Platform::Google,
        Some("refresh-1"),
        Utc::now() + Duration::hours(1),
    )
    .await;

    let date = days_ago(1);
    engine(
        &db.pool,
        StubAdapter::new(Platform::Meta),
        StubAdapter::new(Platform::Google).with_rows(vec![fetched_row("camp-1", date, 10.0)]),
    )
    .sync_client("c1")
    .await
    .expect("first sync");

    // Same key, newer upstream value.
    engine(
        &db.pool,
        StubAdapter::new(Platform::Meta),
        StubAdapter::new(Platform::Google).with_rows(vec![fetched_row("camp-1", date, 42.0)]),
    )
    .sync_client("c1")
    .await
    .expect("second sync");

    assert_eq!(count_metrics(&db.pool).await, 1);
    let (spend,): (f64,) = sqlx::query_as("SELECT spend FROM campaign_metrics")
        .fetch_one(&db.pool)
        .await
        .expect("spend");
    assert_eq!(spend, 42.0);
}

#[tokio::test]
async fn one_platform_failure_does_not_block_the_other() {
    let db = test_db("sync-isolation").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    let expiry = Utc::now() + Duration::hours(1);
    seed_credential(&db.pool, "c1", Platform::Meta, None, expiry).await;
    seed_credential(&db.pool, "c1", Platform::Google, Some("refresh-1"), expiry).await;

    let summary = engine(
        &db.pool,
        StubAdapter::new(Platform::Meta).failing_fetch(),
        StubAdapter::new(Platform::Google)
            .with_rows(vec![fetched_row("camp-1", days_ago(1), 5.0)]),
    )
    .sync_client("c1")
    .await
    .expect("sync despite meta failure");

    assert_eq!(summary.meta_synced, 0);
    assert_eq!(summary.google_synced, 1);
    assert_eq!(count_metrics(&db.pool).await, 1);
}

#[tokio::test]
async fn unconnected_platform_is_skipped_silently() {
    let db = test_db("sync-skip").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    seed_credential(
        &db.pool,
        "c1",
        Platform::Meta,
        None,
        Utc::now() + Duration::hours(1),
    )
    .await;

    let summary = engine(
        &db.pool,
        StubAdapter::new(Platform::Meta).with_rows(vec![fetched_row("m-1", days_ago(1), 3.0)]),
        StubAdapter::new(Platform::Google),
    )
    .sync_client("c1")
    .await
    .expect("sync");

    assert_eq!(summary.meta_synced, 1);
    assert_eq!(summary.google_synced, 0);
}

#[tokio::test]
async fn unknown_client_is_not_found() {
    let db = test_db("sync-unknown").await;

    let result = engine(
        &db.pool,
        StubAdapter::new(Platform::Meta),
        StubAdapter::new(Platform::Google),
    )
    .sync_client("missing")
    .await;

    assert!(matches!(result, Err(AdmetraError::NotFound("client"))));
}
