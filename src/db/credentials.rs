//! Credential storage.
//!
//! [`CredentialStore`] is a thin decorator over the raw repository applying
//! encrypt-on-write / decrypt-on-read for the columns listed in
//! [`SENSITIVE_COLUMNS`]. Nothing above this layer ever sees ciphertext, and
//! nothing below it ever sees a plaintext token.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::crypto::TokenCipher;
use crate::db::SqlitePool;
use crate::db::models::{Credential, format_timestamp, parse_timestamp};
use crate::error::AdmetraError;
use crate::platforms::Platform;

/// Which columns hold secrets, per table. This is the single authority on
/// what gets encrypted at rest.
pub const SENSITIVE_COLUMNS: &[(&str, &[&str])] =
    &[("ad_credentials", &["access_token", "refresh_token"])];

/// Plain SQL access; stores and returns column values verbatim.
#[derive(Clone)]
struct RawCredentialRepo {
    pool: SqlitePool,
}

impl RawCredentialRepo {
    async fn upsert(&self, cred: &Credential) -> Result<(), AdmetraError> {
        sqlx::query(
            r#"
            INSERT INTO ad_credentials (
                client_id, platform, account_id, access_token, refresh_token, token_expiry
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(client_id, platform) DO UPDATE SET
                account_id=excluded.account_id,
                access_token=excluded.access_token,
                refresh_token=excluded.refresh_token,
                token_expiry=excluded.token_expiry
            "#,
        )
        .bind(&cred.client_id)
        .bind(cred.platform.as_str())
        .bind(&cred.account_id)
        .bind(&cred.access_token)
        .bind(&cred.refresh_token)
        .bind(format_timestamp(cred.token_expiry))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(
        &self,
        client_id: &str,
        platform: Platform,
    ) -> Result<Option<Credential>, AdmetraError> {
        let row = sqlx::query(
            r#"SELECT client_id, platform, account_id, access_token, refresh_token, token_expiry
               FROM ad_credentials WHERE client_id = ? AND platform = ?"#,
        )
        .bind(client_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_credential).transpose()
    }

    async fn list_expiring(
        &self,
        platform: Platform,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Credential>, AdmetraError> {
        let rows = sqlx::query(
            r#"SELECT client_id, platform, account_id, access_token, refresh_token, token_expiry
               FROM ad_credentials WHERE platform = ? AND token_expiry < ? ORDER BY id"#,
        )
        .bind(platform.as_str())
        .bind(format_timestamp(threshold))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_credential).collect()
    }

    async fn update_tokens(
        &self,
        client_id: &str,
        platform: Platform,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: DateTime<Utc>,
    ) -> Result<(), AdmetraError> {
        sqlx::query(
            r#"UPDATE ad_credentials SET
                access_token = ?,
                refresh_token = ?,
                token_expiry = ?
              WHERE client_id = ? AND platform = ?"#,
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(format_timestamp(token_expiry))
        .bind(client_id)
        .bind(platform.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_credential(row: SqliteRow) -> Result<Credential, AdmetraError> {
    let platform: String = row.try_get("platform")?;
    let expiry_str: String = row.try_get("token_expiry")?;

    Ok(Credential {
        client_id: row.try_get("client_id")?,
        platform: platform.parse()?,
        account_id: row.try_get("account_id")?,
        access_token: row.try_get("access_token")?,
        refresh_token: row.try_get("refresh_token")?,
        token_expiry: parse_timestamp(&expiry_str)?,
    })
}

/// Encrypting decorator; the only credential API visible to the rest of the
/// crate.
#[derive(Clone)]
pub struct CredentialStore {
    raw: RawCredentialRepo,
    cipher: TokenCipher,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool, cipher: TokenCipher) -> Self {
        Self {
            raw: RawCredentialRepo { pool },
            cipher,
        }
    }

    pub async fn upsert(&self, cred: Credential) -> Result<(), AdmetraError> {
        let sealed = self.seal(cred)?;
        self.raw.upsert(&sealed).await
    }

    pub async fn find(
        &self,
        client_id: &str,
        platform: Platform,
    ) -> Result<Option<Credential>, AdmetraError> {
        self.raw
            .find(client_id, platform)
            .await?
            .map(|cred| self.open(cred))
            .transpose()
    }

    /// Credentials whose expiry falls before `threshold`, tokens decrypted.
    pub async fn list_expiring(
        &self,
        platform: Platform,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Credential>, AdmetraError> {
        self.raw
            .list_expiring(platform, threshold)
            .await?
            .into_iter()
            .map(|cred| self.open(cred))
            .collect()
    }

    pub async fn update_tokens(
        &self,
        client_id: &str,
        platform: Platform,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: DateTime<Utc>,
    ) -> Result<(), AdmetraError> {
        let access_token = self.cipher.encrypt(access_token)?;
        let refresh_token = refresh_token
            .map(|t| self.cipher.encrypt(t))
            .transpose()?;
        self.raw
            .update_tokens(
                client_id,
                platform,
                &access_token,
                refresh_token.as_deref(),
                token_expiry,
            )
            .await
    }

    fn seal(&self, cred: Credential) -> Result<Credential, AdmetraError> {
        Ok(Credential {
            access_token: self.cipher.encrypt(&cred.access_token)?,
            refresh_token: cred
                .refresh_token
                .as_deref()
                .map(|t| self.cipher.encrypt(t))
                .transpose()?,
            ..cred
        })
    }

    fn open(&self, cred: Credential) -> Result<Credential, AdmetraError> {
        Ok(Credential {
            access_token: self.cipher.decrypt(&cred.access_token)?,
            refresh_token: cred
                .refresh_token
                .as_deref()
                .map(|t| self.cipher.decrypt(t))
                .transpose()?,
            ..cred
        })
    }
}
