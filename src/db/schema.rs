//! SQL DDL for initializing the storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema:
/// - `clients` is the minimal projection of the externally-owned Client
///   entity (existence and agency-ownership checks).
/// - `ad_credentials` holds one row per (client, platform); token columns
///   store ciphertext (see `db::credentials::SENSITIVE_COLUMNS`).
/// - `campaign_metrics` is UNIQUE on the sync natural key
///   (client_id, platform, campaign_id, date).
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    agency_id TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clients_agency ON clients(agency_id);

CREATE TABLE IF NOT EXISTS ad_credentials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id TEXT NOT NULL,
    platform TEXT NOT NULL,
    account_id TEXT NOT NULL,
    access_token TEXT NOT NULL,
    refresh_token TEXT NULL,
    token_expiry TEXT NOT NULL, -- RFC3339
    UNIQUE (client_id, platform)
);

CREATE TABLE IF NOT EXISTS campaign_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id TEXT NOT NULL,
    platform TEXT NOT NULL,
    campaign_id TEXT NOT NULL,
    date TEXT NOT NULL, -- YYYY-MM-DD, UTC day
    spend REAL NOT NULL DEFAULT 0,
    impressions INTEGER NOT NULL DEFAULT 0,
    clicks INTEGER NOT NULL DEFAULT 0,
    conversions REAL NOT NULL DEFAULT 0,
    roas REAL NULL,
    cpa REAL NULL,
    UNIQUE (client_id, platform, campaign_id, date)
);

CREATE INDEX IF NOT EXISTS idx_campaign_metrics_client_date
    ON campaign_metrics(client_id, date);
"#;
