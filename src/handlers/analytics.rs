//! Agency-scoped analytics reads.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::error::AdmetraError;
use crate::middleware::auth::AuthedUser;
use crate::platforms::Platform;
use crate::router::AppState;
use crate::service::analytics::{AgencySummary, CampaignSummary, TrendPoint};

const DEFAULT_DAYS: i64 = 7;
const DEFAULT_TOP_LIMIT: i64 = 5;

fn agency_of(user: &AuthedUser) -> Result<&str, AdmetraError> {
    user.agency_id
        .as_deref()
        .ok_or(AdmetraError::NotFound("agency"))
}

fn clamp_days(days: Option<i64>) -> i64 {
    days.unwrap_or(DEFAULT_DAYS).clamp(1, 365)
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}

/// GET /analytics/summary
pub async fn summary(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<AgencySummary>, AdmetraError> {
    let agency_id = agency_of(&user)?;
    Ok(Json(
        state
            .analytics
            .summary(agency_id, clamp_days(query.days))
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct TopCampaignsQuery {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /analytics/top-campaigns
pub async fn top_campaigns(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(query): Query<TopCampaignsQuery>,
) -> Result<Json<Vec<CampaignSummary>>, AdmetraError> {
    let agency_id = agency_of(&user)?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, 50);
    Ok(Json(
        state
            .analytics
            .top_campaigns(agency_id, clamp_days(query.days), limit)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub days: Option<i64>,
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub trend: Vec<TrendPoint>,
}

/// GET /analytics/spend-trend
pub async fn spend_trend(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(query): Query<TrendQuery>,
) -> Result<Json<TrendResponse>, AdmetraError> {
    let agency_id = agency_of(&user)?;
    let platform = query
        .platform
        .as_deref()
        .map(str::parse::<Platform>)
        .transpose()?;

    let trend = state
        .analytics
        .spend_trend(agency_id, clamp_days(query.days), platform)
        .await?;
    Ok(Json(TrendResponse { trend }))
}
