//! Signed, ephemeral OAuth `state` payload.
//!
//! The callback is stateless: everything needed to finish the flow rides in
//! the state parameter itself, signed so it cannot be forged and stamped with
//! an absolute expiry.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::crypto::{sign_state, verify_signature};
use crate::error::AdmetraError;
use crate::platforms::Platform;

pub const STATE_TTL_SECS: i64 = 10 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePayload {
    pub platform: Platform,
    pub client_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
    /// Unix seconds.
    pub exp: i64,
}

impl StatePayload {
    pub fn issue(
        platform: Platform,
        client_id: &str,
        user_id: &str,
        return_to: Option<String>,
    ) -> Self {
        Self {
            platform,
            client_id: client_id.to_owned(),
            user_id: user_id.to_owned(),
            return_to,
            exp: Utc::now().timestamp() + STATE_TTL_SECS,
        }
    }
}

pub fn encode_state(payload: &StatePayload, secret: &str) -> Result<String, AdmetraError> {
    let encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
    let signature = sign_state(secret, &encoded);
    Ok(format!("{encoded}.{signature}"))
}

pub fn verify_state(value: &str, secret: &str) -> Result<StatePayload, AdmetraError> {
    let Some((encoded, signature)) = value.split_once('.') else {
        return Err(AdmetraError::InvalidState("malformed state parameter"));
    };

    if !verify_signature(secret, encoded, signature) {
        return Err(AdmetraError::InvalidState("signature mismatch"));
    }

    let raw = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| AdmetraError::InvalidState("undecodable state payload"))?;
    let payload: StatePayload = serde_json::from_slice(&raw)
        .map_err(|_| AdmetraError::InvalidState("undecodable state payload"))?;

    if Utc::now().timestamp() > payload.exp {
        return Err(AdmetraError::InvalidState("state expired"));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "state-secret";

    #[test]
    fn issue_and_verify_round_trip() {
        let payload = StatePayload::issue(
            Platform::Google,
            "client-1",
            "user-1",
            Some("/dashboard/clients".to_string()),
        );
        let state = encode_state(&payload, SECRET).expect("encode");
        assert_eq!(verify_state(&state, SECRET).expect("verify"), payload);
    }

    #[test]
    fn expired_state_is_rejected_despite_valid_signature() {
        let payload = StatePayload {
            platform: Platform::Meta,
            client_id: "client-1".to_string(),
            user_id: "user-1".to_string(),
            return_to: None,
            exp: Utc::now().timestamp() - 1,
        };
        let state = encode_state(&payload, SECRET).expect("encode");
        assert!(matches!(
            verify_state(&state, SECRET),
            Err(AdmetraError::InvalidState("state expired"))
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let payload = StatePayload::issue(Platform::Meta, "client-1", "user-1", None);
        let state = encode_state(&payload, SECRET).expect("encode");
        let (_, signature) = state.split_once('.').expect("dot");

        let forged = StatePayload::issue(Platform::Meta, "client-2", "user-1", None);
        let forged_body =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).expect("serialize"));
        assert!(verify_state(&format!("{forged_body}.{signature}"), SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = StatePayload::issue(Platform::Google, "client-1", "user-1", None);
        let state = encode_state(&payload, SECRET).expect("encode");
        assert!(verify_state(&state, "other-secret").is_err());
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(verify_state("no-dot-here", SECRET).is_err());
    }
}
