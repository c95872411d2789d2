use axum::Json;
use axum::extract::{Path, State};

use crate::error::AdmetraError;
use crate::middleware::auth::AuthedUser;
use crate::router::AppState;
use crate::service::sync::SyncSummary;

/// POST /sync/clients/{id} -> run a sync for one client and return the
/// per-platform counts.
pub async fn sync_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthedUser,
) -> Result<Json<SyncSummary>, AdmetraError> {
    let client = state
        .clients
        .get(&id)
        .await?
        .ok_or(AdmetraError::NotFound("client"))?;
    user.ensure_can_manage(&client)?;

    Ok(Json(state.sync.sync_client(&id).await?))
}
