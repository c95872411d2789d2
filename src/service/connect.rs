//! OAuth connect flow: authorize-URL issuance and callback completion.

use tracing::info;
use url::Url;

use crate::db::models::Credential;
use crate::db::{ClientDirectory, CredentialStore};
use crate::error::AdmetraError;
use crate::middleware::auth::AuthedUser;
use crate::oauth_state::{StatePayload, encode_state, verify_state};
use crate::platforms::{AdapterSet, Platform};

pub const DEFAULT_RETURN_TO: &str = "/dashboard/clients";

pub struct ConnectService {
    clients: ClientDirectory,
    credentials: CredentialStore,
    adapters: AdapterSet,
    state_secret: String,
}

impl ConnectService {
    pub fn new(
        clients: ClientDirectory,
        credentials: CredentialStore,
        adapters: AdapterSet,
        state_secret: String,
    ) -> Self {
        Self {
            clients,
            credentials,
            adapters,
            state_secret,
        }
    }

    /// Build the consent redirect for a client the caller may manage.
    pub async fn authorize_url(
        &self,
        platform: Platform,
        client_id: &str,
        user: &AuthedUser,
        return_to: Option<String>,
    ) -> Result<Url, AdmetraError> {
        let client = self
            .clients
            .get(client_id)
            .await?
            .ok_or(AdmetraError::NotFound("client"))?;
        user.ensure_can_manage(&client)?;

        let payload = StatePayload::issue(platform, client_id, &user.user_id, return_to);
        let state = encode_state(&payload, &self.state_secret)?;
        self.adapters.for_platform(platform).build_authorize_url(&state)
    }

    /// Finish the flow: verify state, exchange the code, resolve the ad
    /// account, merge the refresh token and upsert the credential. Returns
    /// the redirect target carried in the state.
    pub async fn complete_callback(
        &self,
        platform: Platform,
        code: &str,
        state_param: &str,
    ) -> Result<String, AdmetraError> {
        let state = verify_state(state_param, &self.state_secret)?;
        if state.platform != platform {
            return Err(AdmetraError::InvalidState("platform mismatch"));
        }

        let adapter = self.adapters.for_platform(platform);
        let grant = adapter.exchange_code(code).await?;

        let account_id = adapter
            .fetch_account_identifier(&grant.access_token)
            .await?
            .ok_or(AdmetraError::NoLinkedAccount(platform))?;

        let existing = self.credentials.find(&state.client_id, platform).await?;
        let refresh_token = match platform {
            // Meta has no refresh token in this model, whatever the exchange
            // claims to return.
            Platform::Meta => None,
            // Google only returns one on first consent; keep the stored
            // token rather than overwriting it with nothing. A credential
            // with no refresh token anywhere could never be renewed.
            Platform::Google => Some(
                grant
                    .refresh_token
                    .clone()
                    .or(existing.and_then(|c| c.refresh_token))
                    .ok_or(AdmetraError::MissingRefreshToken)?,
            ),
        };

        self.credentials
            .upsert(Credential {
                client_id: state.client_id.clone(),
                platform,
                account_id,
                access_token: grant.access_token.clone(),
                refresh_token,
                token_expiry: grant.expiry(),
            })
            .await?;

        info!(client_id = %state.client_id, %platform, "credential connected");
        Ok(state
            .return_to
            .unwrap_or_else(|| DEFAULT_RETURN_TO.to_owned()))
    }
}
