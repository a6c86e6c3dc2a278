use anyhow::Result;
use duckdb::OptionalExt;
use tracing::info;

use crate::backend::{rand_hex, DuckDbBackend};

const JWT_SECRET_KEY: &str = "jwt_secret";

impl DuckDbBackend {
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let result = conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?
            .query_row(duckdb::params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(result)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            duckdb::params![key, value],
        )?;
        Ok(())
    }

    /// Return the persisted token-signing secret, generating one on first use.
    pub async fn ensure_jwt_secret(&self) -> Result<String> {
        if let Some(secret) = self.get_setting(JWT_SECRET_KEY).await? {
            return Ok(secret);
        }
        let secret = rand_hex(32);
        self.set_setting(JWT_SECRET_KEY, &secret).await?;
        info!("generated new JWT secret");
        Ok(secret)
    }
}
