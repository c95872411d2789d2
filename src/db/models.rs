use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AdmetraError;
use crate::platforms::{FetchedMetricRow, Platform};

/// Minimal projection of the externally-owned Client entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: String,
    pub agency_id: String,
    pub name: String,
}

/// Stored OAuth material for one client+platform pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub client_id: String,
    pub platform: Platform,
    /// Platform-native external account id (Google customer id, Meta ad
    /// account id).
    pub account_id: String,
    pub access_token: String,
    /// Always `None` for Meta; Meta renews by re-exchanging the access token.
    pub refresh_token: Option<String>,
    pub token_expiry: DateTime<Utc>,
}

/// Normalized daily performance record.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub client_id: String,
    pub platform: Platform,
    pub campaign_id: String,
    pub date: NaiveDate,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: f64,
}

impl MetricRow {
    pub fn from_fetched(client_id: &str, platform: Platform, fetched: FetchedMetricRow) -> Self {
        Self {
            client_id: client_id.to_owned(),
            platform,
            campaign_id: fetched.campaign_id,
            date: fetched.date,
            spend: fetched.spend,
            impressions: fetched.impressions,
            clicks: fetched.clicks,
            conversions: fetched.conversions,
        }
    }
}

/// Uniform RFC3339 rendering so stored timestamps compare lexicographically.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AdmetraError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_in_lexicographic_form() {
        let now = Utc::now();
        let rendered = format_timestamp(now);
        assert!(rendered.ends_with('Z'));
        let parsed = parse_timestamp(&rendered).expect("parse");
        assert_eq!(parsed.timestamp(), now.timestamp());

        let earlier = format_timestamp(now - chrono::Duration::hours(1));
        assert!(earlier < rendered);
    }
}
