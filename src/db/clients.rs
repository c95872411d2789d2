use crate::db::SqlitePool;
use crate::db::models::Client;
use crate::error::AdmetraError;

/// Read access to the Client projection. Client CRUD lives in the outer
/// application; this core only checks existence and agency ownership.
#[derive(Clone)]
pub struct ClientDirectory {
    pool: SqlitePool,
}

impl ClientDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Client>, AdmetraError> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, agency_id, name FROM clients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// Mirror a client record into the projection (used by the owning
    /// application's sync hooks and by tests).
    pub async fn upsert(&self, client: &Client) -> Result<(), AdmetraError> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, agency_id, name) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                agency_id=excluded.agency_id,
                name=excluded.name
            "#,
        )
        .bind(&client.id)
        .bind(&client.agency_id)
        .bind(&client.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
