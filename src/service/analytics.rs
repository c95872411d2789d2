//! Read-side aggregations over the normalized metrics store.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::MetricsStore;
use crate::db::metrics::CampaignTotals;
use crate::error::AdmetraError;
use crate::platforms::Platform;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencySummary {
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: f64,
    /// Percent; 0 when there were no impressions.
    pub ctr: f64,
    pub roas: Option<f64>,
    pub cpa: Option<f64>,
    /// None when the baseline window spent exactly zero ("no comparable
    /// baseline"), never NaN or infinite.
    pub spend_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    pub platform: Platform,
    pub campaign_id: String,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: f64,
}

impl From<CampaignTotals> for CampaignSummary {
    fn from(totals: CampaignTotals) -> Self {
        Self {
            platform: totals.platform,
            campaign_id: totals.campaign_id,
            spend: totals.spend,
            impressions: totals.impressions,
            clicks: totals.clicks,
            conversions: totals.conversions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub spend: f64,
}

pub struct Analytics {
    metrics: MetricsStore,
}

impl Analytics {
    pub fn new(metrics: MetricsStore) -> Self {
        Self { metrics }
    }

    /// Totals over the trailing window plus period-over-period spend change
    /// against the immediately preceding equal-length window.
    pub async fn summary(
        &self,
        agency_id: &str,
        days: i64,
    ) -> Result<AgencySummary, AdmetraError> {
        let (start, end) = window(days);
        let baseline_start = start - Duration::days(days);

        let totals = self.metrics.window_totals(agency_id, start, end).await?;
        let baseline_spend = self
            .metrics
            .window_spend(agency_id, baseline_start, start)
            .await?;

        let ctr = if totals.impressions > 0 {
            totals.clicks as f64 / totals.impressions as f64 * 100.0
        } else {
            0.0
        };

        Ok(AgencySummary {
            spend: totals.spend,
            impressions: totals.impressions,
            clicks: totals.clicks,
            conversions: totals.conversions,
            ctr,
            roas: totals.roas,
            cpa: totals.cpa,
            spend_change_pct: percent_change(totals.spend, baseline_spend),
        })
    }

    pub async fn top_campaigns(
        &self,
        agency_id: &str,
        days: i64,
        limit: i64,
    ) -> Result<Vec<CampaignSummary>, AdmetraError> {
        let (start, end) = window(days);
        let totals = self
            .metrics
            .top_campaigns(agency_id, start, end, limit)
            .await?;
        Ok(totals.into_iter().map(CampaignSummary::from).collect())
    }

    /// Daily spend buckets, ascending; days without data are absent.
    pub async fn spend_trend(
        &self,
        agency_id: &str,
        days: i64,
        platform: Option<Platform>,
    ) -> Result<Vec<TrendPoint>, AdmetraError> {
        let (start, end) = window(days);
        let buckets = self
            .metrics
            .spend_by_day(agency_id, start, end, platform)
            .await?;
        Ok(buckets
            .into_iter()
            .map(|(date, spend)| TrendPoint { date, spend })
            .collect())
    }
}

fn window(days: i64) -> (NaiveDate, NaiveDate) {
    let end = Utc::now().date_naive();
    (end - Duration::days(days), end)
}

fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_is_none_on_zero_baseline() {
        assert_eq!(percent_change(100.0, 0.0), None);
        assert_eq!(percent_change(0.0, 0.0), None);
    }

    #[test]
    fn percent_change_is_signed() {
        assert_eq!(percent_change(150.0, 100.0), Some(50.0));
        assert_eq!(percent_change(50.0, 100.0), Some(-50.0));
    }
}
