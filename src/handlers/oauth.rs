//! OAuth connect endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use serde::Deserialize;
use tracing::info;

use crate::error::AdmetraError;
use crate::middleware::auth::AuthedUser;
use crate::platforms::Platform;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeQuery {
    pub client_id: String,
    pub return_to: Option<String>,
}

/// GET /integrations/{platform}/authorize -> redirect to the consent screen.
pub async fn authorize(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    user: AuthedUser,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Redirect, AdmetraError> {
    let platform: Platform = platform.parse()?;
    let url = state
        .connect
        .authorize_url(platform, &query.client_id, &user, query.return_to)
        .await?;

    info!(client_id = %query.client_id, %platform, "dispatching OAuth redirect");
    Ok(Redirect::temporary(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// GET /integrations/{platform}/callback -> exchange the code, store the
/// credential, bounce back to the app. The signed state parameter is the
/// only authentication here; the platform redirect carries no session.
pub async fn callback(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AdmetraError> {
    let platform: Platform = platform.parse()?;
    let (Some(code), Some(state_param)) = (query.code.as_deref(), query.state.as_deref()) else {
        return Err(AdmetraError::InvalidState("missing code or state"));
    };

    let return_to = state
        .connect
        .complete_callback(platform, code, state_param)
        .await?;
    Ok(Redirect::temporary(&return_to))
}
