mod common;

use admetra::db::MetricsStore;
use admetra::db::models::MetricRow;
use admetra::platforms::Platform;
use admetra::service::Analytics;

use common::{days_ago, seed_client, seed_metric, test_db};

#[tokio::test]
async fn summary_sums_the_window_and_compares_against_the_previous_one() {
    let db = test_db("analytics-summary").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    seed_client(&db.pool, "c2", "agency-a").await;
    seed_client(&db.pool, "other", "agency-b").await;

    // Current 7-day window.
    seed_metric(&db.pool, "c1", Platform::Google, "camp-1", days_ago(1), 100.0).await;
    seed_metric(&db.pool, "c2", Platform::Meta, "camp-2", days_ago(2), 50.0).await;
    // Baseline window [14 days ago, 7 days ago).
    seed_metric(&db.pool, "c1", Platform::Google, "camp-1", days_ago(10), 75.0).await;
    // Another agency's data must not leak in.
    seed_metric(&db.pool, "other", Platform::Google, "camp-x", days_ago(1), 999.0).await;

    let summary = Analytics::new(MetricsStore::new(db.pool.clone()))
        .summary("agency-a", 7)
        .await
        .expect("summary");

    assert_eq!(summary.spend, 150.0);
    assert_eq!(summary.spend_change_pct, Some(100.0));
    assert_eq!(summary.roas, None);
    assert_eq!(summary.cpa, None);
}

#[tokio::test]
async fn summary_with_zero_baseline_has_no_change_percentage() {
    let db = test_db("analytics-zero-baseline").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    seed_metric(&db.pool, "c1", Platform::Meta, "camp-1", days_ago(1), 80.0).await;

    let summary = Analytics::new(MetricsStore::new(db.pool.clone()))
        .summary("agency-a", 7)
        .await
        .expect("summary");

    assert_eq!(summary.spend, 80.0);
    assert_eq!(summary.spend_change_pct, None);
}

#[tokio::test]
async fn summary_computes_ctr_from_window_totals() {
    let db = test_db("analytics-ctr").await;
    seed_client(&db.pool, "c1", "agency-a").await;

    let store = MetricsStore::new(db.pool.clone());
    store
        .upsert(&MetricRow {
            client_id: "c1".to_string(),
            platform: Platform::Google,
            campaign_id: "camp-1".to_string(),
            date: days_ago(1),
            spend: 10.0,
            impressions: 1000,
            clicks: 20,
            conversions: 2.0,
        })
        .await
        .expect("upsert");

    let summary = Analytics::new(store)
        .summary("agency-a", 7)
        .await
        .expect("summary");

    assert_eq!(summary.impressions, 1000);
    assert_eq!(summary.clicks, 20);
    assert_eq!(summary.ctr, 2.0);
    assert_eq!(summary.conversions, 2.0);
}

#[tokio::test]
async fn empty_window_yields_zeroed_summary() {
    let db = test_db("analytics-empty").await;
    seed_client(&db.pool, "c1", "agency-a").await;

    let summary = Analytics::new(MetricsStore::new(db.pool.clone()))
        .summary("agency-a", 7)
        .await
        .expect("summary");

    assert_eq!(summary.spend, 0.0);
    assert_eq!(summary.ctr, 0.0);
    assert_eq!(summary.spend_change_pct, None);
}

#[tokio::test]
async fn trend_is_sparse_and_ascending() {
    let db = test_db("analytics-trend").await;
    seed_client(&db.pool, "c1", "agency-a").await;

    // Only 2 of the 7 days have data; same day across campaigns sums.
    seed_metric(&db.pool, "c1", Platform::Meta, "camp-1", days_ago(5), 10.0).await;
    seed_metric(&db.pool, "c1", Platform::Google, "camp-2", days_ago(5), 15.0).await;
    seed_metric(&db.pool, "c1", Platform::Meta, "camp-1", days_ago(1), 30.0).await;

    let trend = Analytics::new(MetricsStore::new(db.pool.clone()))
        .spend_trend("agency-a", 7, None)
        .await
        .expect("trend");

    assert_eq!(trend.len(), 2);
    assert_eq!(trend[0].date, days_ago(5));
    assert_eq!(trend[0].spend, 25.0);
    assert_eq!(trend[1].date, days_ago(1));
    assert_eq!(trend[1].spend, 30.0);
}

#[tokio::test]
async fn trend_can_be_filtered_to_one_platform() {
    let db = test_db("analytics-trend-filter").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    seed_metric(&db.pool, "c1", Platform::Meta, "camp-1", days_ago(3), 10.0).await;
    seed_metric(&db.pool, "c1", Platform::Google, "camp-2", days_ago(3), 40.0).await;

    let trend = Analytics::new(MetricsStore::new(db.pool.clone()))
        .spend_trend("agency-a", 7, Some(Platform::Google))
        .await
        .expect("trend");

    assert_eq!(trend.len(), 1);
    assert_eq!(trend[0].spend, 40.0);
}

#[tokio::test]
async fn top_campaigns_order_by_total_spend_and_honor_the_limit() {
    let db = test_db("analytics-top").await;
    seed_client(&db.pool, "c1", "agency-a").await;

    // camp-b spends most across two days.
    seed_metric(&db.pool, "c1", Platform::Meta, "camp-a", days_ago(1), 30.0).await;
    seed_metric(&db.pool, "c1", Platform::Google, "camp-b", days_ago(1), 25.0).await;
    seed_metric(&db.pool, "c1", Platform::Google, "camp-b", days_ago(2), 25.0).await;
    seed_metric(&db.pool, "c1", Platform::Meta, "camp-c", days_ago(1), 5.0).await;

    let top = Analytics::new(MetricsStore::new(db.pool.clone()))
        .top_campaigns("agency-a", 7, 2)
        .await
        .expect("top campaigns");

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].campaign_id, "camp-b");
    assert_eq!(top[0].spend, 50.0);
    assert_eq!(top[0].platform, Platform::Google);
    assert_eq!(top[1].campaign_id, "camp-a");
    assert_eq!(top[1].spend, 30.0);
}

#[tokio::test]
async fn same_campaign_id_on_different_platforms_stays_separate() {
    let db = test_db("analytics-cross-platform").await;
    seed_client(&db.pool, "c1", "agency-a").await;
    seed_metric(&db.pool, "c1", Platform::Meta, "shared", days_ago(1), 10.0).await;
    seed_metric(&db.pool, "c1", Platform::Google, "shared", days_ago(1), 20.0).await;

    let top = Analytics::new(MetricsStore::new(db.pool.clone()))
        .top_campaigns("agency-a", 7, 10)
        .await
        .expect("top campaigns");

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].platform, Platform::Google);
    assert_eq!(top[1].platform, Platform::Meta);
}
