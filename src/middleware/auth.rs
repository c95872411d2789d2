//! Caller identity extraction.
//!
//! Session authentication lives in the outer application; by the time a
//! request reaches this core the auth layer has resolved the caller and
//! injected it as headers:
//! - `x-user-id` (required)
//! - `x-agency-id` (absent for users without an agency)
//! - `x-super-admin` (`1` or `true`)
//!
//! Requests without a user id are rejected with 401 before any handler runs.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};

use crate::db::models::Client;
use crate::error::AdmetraError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const AGENCY_ID_HEADER: &str = "x-agency-id";
pub const SUPER_ADMIN_HEADER: &str = "x-super-admin";

#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
    pub agency_id: Option<String>,
    pub is_super_admin: bool,
}

impl AuthedUser {
    /// Agency ownership check; super admins may manage any client.
    pub fn ensure_can_manage(&self, client: &Client) -> Result<(), AdmetraError> {
        if self.is_super_admin || self.agency_id.as_deref() == Some(client.agency_id.as_str()) {
            Ok(())
        } else {
            Err(AdmetraError::Forbidden)
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = AdmetraError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let Some(user_id) = header_str(headers, USER_ID_HEADER) else {
            return Err(AdmetraError::Unauthorized);
        };

        Ok(Self {
            user_id: user_id.to_owned(),
            agency_id: header_str(headers, AGENCY_ID_HEADER).map(str::to_owned),
            is_super_admin: matches!(
                header_str(headers, SUPER_ADMIN_HEADER),
                Some("1" | "true")
            ),
        })
    }
}
