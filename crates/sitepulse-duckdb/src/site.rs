use anyhow::Result;
use duckdb::OptionalExt;
use serde::Serialize;
use tracing::debug;

use sitepulse_core::site::generate_site_id;

use crate::DuckDbBackend;

/// A registered site. The owner never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    pub site_id: String,
    #[serde(skip_serializing)]
    pub owner: String,
    pub domain: String,
    pub created_at: String,
}

const SITE_COLUMNS: &str = "site_id, owner, domain, CAST(created_at AS VARCHAR)";

fn site_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Site> {
    Ok(Site {
        site_id: row.get(0)?,
        owner: row.get(1)?,
        domain: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl DuckDbBackend {
    /// Register a new site for `owner` under a freshly generated id.
    ///
    /// `domain` is stored as given; callers validate it.
    pub async fn create_site(&self, owner: &str, domain: &str) -> Result<Site> {
        let conn = self.conn.lock().await;
        let site_id = generate_site_id();

        conn.execute(
            "INSERT INTO sites (site_id, owner, domain, created_at) \
             VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)",
            duckdb::params![site_id, owner, domain],
        )?;

        let site = conn
            .prepare(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE site_id = ?1"))?
            .query_row(duckdb::params![site_id], site_from_row)?;
        debug!(site_id = %site.site_id, owner, "site created");
        Ok(site)
    }

    pub async fn get_site(&self, site_id: &str) -> Result<Option<Site>> {
        let conn = self.conn.lock().await;
        let result = conn
            .prepare(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE site_id = ?1"))?
            .query_row(duckdb::params![site_id], site_from_row)
            .optional()?;
        Ok(result)
    }

    pub async fn site_exists(&self, site_id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .prepare("SELECT COUNT(*) FROM sites WHERE site_id = ?1")?
            .query_row(duckdb::params![site_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Sites owned by `owner`, oldest first.
    pub async fn list_sites(&self, owner: &str) -> Result<Vec<Site>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SITE_COLUMNS} FROM sites WHERE owner = ?1 ORDER BY created_at, site_id"
        ))?;
        let rows = stmt.query_map(duckdb::params![owner], site_from_row)?;
        let mut sites = Vec::new();
        for row in rows {
            sites.push(row?);
        }
        Ok(sites)
    }

    /// Delete a site and all of its events.
    ///
    /// DuckDB does not enforce foreign keys, so events are removed explicitly
    /// in the same transaction. Returns `false` if the site did not exist.
    pub async fn delete_site(&self, site_id: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let exists: i64 = tx
            .prepare("SELECT COUNT(*) FROM sites WHERE site_id = ?1")?
            .query_row(duckdb::params![site_id], |row| row.get(0))?;
        if exists == 0 {
            return Ok(false);
        }

        let events = tx.execute(
            "DELETE FROM events WHERE site_id = ?1",
            duckdb::params![site_id],
        )?;
        tx.execute(
            "DELETE FROM sites WHERE site_id = ?1",
            duckdb::params![site_id],
        )?;
        tx.commit()?;

        debug!(site_id, events, "site deleted");
        Ok(true)
    }
}
