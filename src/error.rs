use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

use crate::platforms::Platform;

#[derive(Debug, ThisError)]
pub enum AdmetraError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Token cipher error: {0}")]
    Crypto(String),

    #[error("Missing or invalid caller identity")]
    Unauthorized,

    #[error("Caller is not allowed to manage this client")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid OAuth state: {0}")]
    InvalidState(&'static str),

    #[error("{platform} API error: {body}")]
    PlatformApi {
        platform: Platform,
        status: Option<u16>,
        body: String,
    },

    #[error("No {0} ad account is linked to the authorized identity")]
    NoLinkedAccount(Platform),

    #[error("OAuth response contained no refresh token and none is stored")]
    MissingRefreshToken,

    #[error("Credential has no access token; connect the account first")]
    MissingAccessToken,
}

type OAuth2TokenError = RequestTokenError<
    HttpClientError<ReqwestClientError>,
    StandardErrorResponse<BasicErrorResponseType>,
>;

// Only the Google adapter goes through the oauth2 crate; Meta's nonstandard
// exchange speaks reqwest directly and tags its own errors.
impl From<OAuth2TokenError> for AdmetraError {
    fn from(e: OAuth2TokenError) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => AdmetraError::PlatformApi {
                platform: Platform::Google,
                status: None,
                body: err.to_string(),
            },
            RequestTokenError::Request(req_e) => AdmetraError::PlatformApi {
                platform: Platform::Google,
                status: None,
                body: format!("token request failed: {req_e}"),
            },
            RequestTokenError::Parse(parse_err, _body) => AdmetraError::Json(parse_err.into_inner()),
            RequestTokenError::Other(s) => AdmetraError::PlatformApi {
                platform: Platform::Google,
                status: None,
                body: s,
            },
        }
    }
}

impl IntoResponse for AdmetraError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match &self {
            AdmetraError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "UNAUTHORIZED".to_string(),
                    message: self.to_string(),
                },
            ),
            AdmetraError::Forbidden => (
                StatusCode::FORBIDDEN,
                ApiErrorBody {
                    code: "FORBIDDEN".to_string(),
                    message: self.to_string(),
                },
            ),
            AdmetraError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: self.to_string(),
                },
            ),
            AdmetraError::InvalidState(_) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "INVALID_STATE".to_string(),
                    message: self.to_string(),
                },
            ),
            AdmetraError::NoLinkedAccount(platform) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "NO_LINKED_ACCOUNT".to_string(),
                    message: format!(
                        "No {platform} ad account is reachable with the authorized login. \
                         Connect an account that has at least one ad account linked."
                    ),
                },
            ),
            AdmetraError::MissingRefreshToken => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "MISSING_REFRESH_TOKEN".to_string(),
                    message: self.to_string(),
                },
            ),
            AdmetraError::MissingAccessToken => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "MISSING_ACCESS_TOKEN".to_string(),
                    message: self.to_string(),
                },
            ),
            AdmetraError::PlatformApi { .. } => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody {
                    code: "PLATFORM_API".to_string(),
                    message: self.to_string(),
                },
            ),
            AdmetraError::Reqwest(_) | AdmetraError::UrlParse(_) | AdmetraError::Json(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Upstream service is unavailable.".to_string(),
                },
            ),
            AdmetraError::Database(_) | AdmetraError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                },
            ),
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
