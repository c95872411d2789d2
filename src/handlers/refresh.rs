use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use subtle::ConstantTimeEq;

use crate::error::AdmetraError;
use crate::router::AppState;
use crate::service::refresh::RefreshReport;

/// POST /cron/refresh-tokens -> sweep near-expiry credentials.
/// Protected by the shared cron secret, not end-user auth.
pub async fn refresh_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshReport>, AdmetraError> {
    ensure_cron_authorized(&headers, &state.cron_secret)?;
    Ok(Json(state.refresher.run_sweep().await?))
}

fn ensure_cron_authorized(headers: &HeaderMap, secret: &str) -> Result<(), AdmetraError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .and_then(|auth| {
            auth.strip_prefix("Bearer ")
                .or_else(|| auth.strip_prefix("bearer "))
        })
        .ok_or(AdmetraError::Unauthorized)?;

    if bool::from(token.as_bytes().ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(AdmetraError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(auth).expect("header"));
        headers
    }

    #[test]
    fn matching_bearer_secret_is_accepted() {
        assert!(ensure_cron_authorized(&headers_with("Bearer s3cret"), "s3cret").is_ok());
        assert!(ensure_cron_authorized(&headers_with("bearer s3cret"), "s3cret").is_ok());
    }

    #[test]
    fn wrong_or_missing_secret_is_rejected() {
        assert!(ensure_cron_authorized(&headers_with("Bearer nope"), "s3cret").is_err());
        assert!(ensure_cron_authorized(&headers_with("s3cret"), "s3cret").is_err());
        assert!(ensure_cron_authorized(&HeaderMap::new(), "s3cret").is_err());
    }
}
