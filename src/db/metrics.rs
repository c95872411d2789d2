//! Metric storage: idempotent natural-key upserts on the write side,
//! agency-scoped aggregation queries on the read side.

use chrono::NaiveDate;
use sqlx::Row;

use crate::db::SqlitePool;
use crate::db::models::MetricRow;
use crate::error::AdmetraError;
use crate::platforms::Platform;

/// Sums over one lookback window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowTotals {
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: f64,
    pub roas: Option<f64>,
    pub cpa: Option<f64>,
}

/// Per-campaign sums over one lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignTotals {
    pub platform: Platform,
    pub campaign_id: String,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: f64,
}

#[derive(Clone)]
pub struct MetricsStore {
    pool: SqlitePool,
}

impl MetricsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert on (client_id, platform, campaign_id, date). Re-syncing the
    /// same window overwrites with the latest fetched values; `roas`/`cpa`
    /// are left untouched for downstream enrichment.
    pub async fn upsert(&self, row: &MetricRow) -> Result<(), AdmetraError> {
        sqlx::query(
            r#"
            INSERT INTO campaign_metrics (
                client_id, platform, campaign_id, date,
                spend, impressions, clicks, conversions
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(client_id, platform, campaign_id, date) DO UPDATE SET
                spend=excluded.spend,
                impressions=excluded.impressions,
                clicks=excluded.clicks,
                conversions=excluded.conversions
            "#,
        )
        .bind(&row.client_id)
        .bind(row.platform.as_str())
        .bind(&row.campaign_id)
        .bind(row.date)
        .bind(row.spend)
        .bind(row.impressions)
        .bind(row.clicks)
        .bind(row.conversions)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Sums and averages over `[start, end]` for one agency.
    pub async fn window_totals(
        &self,
        agency_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WindowTotals, AdmetraError> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(m.spend), 0.0) AS spend,
                COALESCE(SUM(m.impressions), 0) AS impressions,
                COALESCE(SUM(m.clicks), 0) AS clicks,
                COALESCE(SUM(m.conversions), 0.0) AS conversions,
                AVG(m.roas) AS roas,
                AVG(m.cpa) AS cpa
            FROM campaign_metrics m
            JOIN clients c ON c.id = m.client_id
            WHERE c.agency_id = ? AND m.date >= ? AND m.date <= ?
            "#,
        )
        .bind(agency_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(WindowTotals {
            spend: row.try_get("spend")?,
            impressions: row.try_get("impressions")?,
            clicks: row.try_get("clicks")?,
            conversions: row.try_get("conversions")?,
            roas: row.try_get("roas")?,
            cpa: row.try_get("cpa")?,
        })
    }

    /// Total spend over `[start, end)` — the baseline window for
    /// period-over-period comparison.
    pub async fn window_spend(
        &self,
        agency_id: &str,
        start: NaiveDate,
        end_exclusive: NaiveDate,
    ) -> Result<f64, AdmetraError> {
        let (spend,): (f64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(m.spend), 0.0)
            FROM campaign_metrics m
            JOIN clients c ON c.id = m.client_id
            WHERE c.agency_id = ? AND m.date >= ? AND m.date < ?
            "#,
        )
        .bind(agency_id)
        .bind(start)
        .bind(end_exclusive)
        .fetch_one(&self.pool)
        .await?;
        Ok(spend)
    }

    /// Per-campaign sums over `[start, end]`, highest spend first.
    pub async fn top_campaigns(
        &self,
        agency_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        limit: i64,
    ) -> Result<Vec<CampaignTotals>, AdmetraError> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.platform,
                m.campaign_id,
                COALESCE(SUM(m.spend), 0.0) AS spend,
                COALESCE(SUM(m.impressions), 0) AS impressions,
                COALESCE(SUM(m.clicks), 0) AS clicks,
                COALESCE(SUM(m.conversions), 0.0) AS conversions
            FROM campaign_metrics m
            JOIN clients c ON c.id = m.client_id
            WHERE c.agency_id = ? AND m.date >= ? AND m.date <= ?
            GROUP BY m.platform, m.campaign_id
            ORDER BY spend DESC
            LIMIT ?
            "#,
        )
        .bind(agency_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let platform: String = row.try_get("platform")?;
                Ok(CampaignTotals {
                    platform: platform.parse()?,
                    campaign_id: row.try_get("campaign_id")?,
                    spend: row.try_get("spend")?,
                    impressions: row.try_get("impressions")?,
                    clicks: row.try_get("clicks")?,
                    conversions: row.try_get("conversions")?,
                })
            })
            .collect()
    }

    /// Daily spend buckets over `[start, end]` in ascending date order.
    /// Days without rows are absent (sparse) rather than zero-filled.
    pub async fn spend_by_day(
        &self,
        agency_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        platform: Option<Platform>,
    ) -> Result<Vec<(NaiveDate, f64)>, AdmetraError> {
        let base = r#"
            SELECT m.date, COALESCE(SUM(m.spend), 0.0) AS spend
            FROM campaign_metrics m
            JOIN clients c ON c.id = m.client_id
            WHERE c.agency_id = ? AND m.date >= ? AND m.date <= ?
        "#;
        let tail = " GROUP BY m.date ORDER BY m.date ASC";

        let rows = if let Some(platform) = platform {
            sqlx::query_as::<_, (NaiveDate, f64)>(
                &format!("{base} AND m.platform = ?{tail}"),
            )
            .bind(agency_id)
            .bind(start)
            .bind(end)
            .bind(platform.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, (NaiveDate, f64)>(&format!("{base}{tail}"))
                .bind(agency_id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(rows)
    }
}
