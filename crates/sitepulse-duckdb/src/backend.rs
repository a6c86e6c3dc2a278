use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::{debug, info};

use sitepulse_core::{event::Event, window::Window};

use crate::schema::init_sql;

/// Generate a cryptographically random hex string of `n` bytes (2n hex chars).
pub(crate) fn rand_hex(n: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Timestamp literal DuckDB casts to `TIMESTAMP` (UTC, microsecond precision).
pub(crate) fn sql_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Round `ts` up to the next whole microsecond, the precision of `TIMESTAMP`.
///
/// Used for lower window bounds so no stored row decodes to an instant before
/// the bound.
fn ceil_micros(ts: &DateTime<Utc>) -> DateTime<Utc> {
    let rem = ts.timestamp_subsec_nanos() % 1_000;
    if rem == 0 {
        *ts
    } else {
        *ts + chrono::Duration::nanoseconds(i64::from(1_000 - rem))
    }
}

/// Convert an `epoch_us(...)` column back into a UTC timestamp.
fn micros_to_utc(idx: usize, us: i64) -> duckdb::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us).ok_or_else(|| {
        duckdb::Error::FromSqlConversionFailure(
            idx,
            duckdb::types::Type::BigInt,
            format!("timestamp out of range: {us}").into(),
        )
    })
}

/// The DuckDB event store and site registry.
///
/// DuckDB is single-writer, so the connection sits behind an async mutex.
/// Every method takes the lock for the duration of one statement (or one
/// transaction) and releases it before returning.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

const EVENT_COLUMNS: &str = "id, site_id, event_type, url, referrer, utm_source, user_agent, \
     language, screen_width, screen_height, session_id, ip_address, country, \
     epoch_us(created_at)";

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(path, memory_limit, "DuckDB opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database. Data is discarded on drop; used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Store `event` if its site is registered.
    ///
    /// The site check and the insert are one statement, so an event can never
    /// land after its site was deleted. Returns `false` when nothing was stored.
    pub async fn insert_event(&self, event: &Event) -> Result<bool> {
        let conn = self.conn.lock().await;
        let stored = insert_event_sync(&conn, event)? == 1;
        if stored {
            debug!(site_id = %event.site_id, session_id = %event.session_id, "event stored");
        }
        Ok(stored)
    }

    /// Replace every event of `site_id` with `events` in a single transaction.
    ///
    /// Events for other sites, or for a site that is not registered, are
    /// skipped. Returns the number of events removed.
    pub async fn replace_site_events(&self, site_id: &str, events: &[Event]) -> Result<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM events WHERE site_id = ?1",
            duckdb::params![site_id],
        )?;
        let mut inserted = 0;
        for event in events.iter().filter(|e| e.site_id == site_id) {
            inserted += insert_event_sync(&tx, event)?;
        }
        tx.commit()?;
        info!(site_id, removed, inserted, "site events replaced");
        Ok(removed)
    }

    pub async fn events_in_window(&self, site_id: &str, window: &Window) -> Result<Vec<Event>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE site_id = ?1 \
               AND created_at >= CAST(?2 AS TIMESTAMP) \
               AND created_at <= CAST(?3 AS TIMESTAMP) \
             ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            duckdb::params![
                site_id,
                sql_timestamp(&ceil_micros(&window.since)),
                sql_timestamp(&window.until)
            ],
            |row| {
                Ok(Event {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    event_type: row.get(2)?,
                    url: row.get(3)?,
                    referrer: row.get(4)?,
                    utm_source: row.get(5)?,
                    user_agent: row.get(6)?,
                    language: row.get(7)?,
                    screen_width: row.get(8)?,
                    screen_height: row.get(9)?,
                    session_id: row.get(10)?,
                    ip_address: row.get(11)?,
                    country: row.get(12)?,
                    timestamp: micros_to_utc(13, row.get(13)?)?,
                })
            },
        )?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// First-ever event timestamp of every session active in `window`.
    pub async fn session_first_seen(
        &self,
        site_id: &str,
        window: &Window,
    ) -> Result<HashMap<String, DateTime<Utc>>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT session_id, epoch_us(MIN(created_at)) \
             FROM events \
             WHERE site_id = ?1 \
               AND session_id IN ( \
                   SELECT DISTINCT session_id FROM events \
                   WHERE site_id = ?2 \
                     AND created_at >= CAST(?3 AS TIMESTAMP) \
                     AND created_at <= CAST(?4 AS TIMESTAMP) \
               ) \
             GROUP BY session_id",
        )?;
        let rows = stmt.query_map(
            duckdb::params![
                site_id,
                site_id,
                sql_timestamp(&ceil_micros(&window.since)),
                sql_timestamp(&window.until)
            ],
            |row| {
                let session_id: String = row.get(0)?;
                let first = micros_to_utc(1, row.get(1)?)?;
                Ok((session_id, first))
            },
        )?;

        let mut first_seen = HashMap::new();
        for row in rows {
            let (session_id, first) = row?;
            first_seen.insert(session_id, first);
        }
        Ok(first_seen)
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the connection lock for direct queries.
    ///
    /// Intended for integration tests that need to inspect stored rows.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

/// Insert one event unless its site is missing. Returns the rows written.
fn insert_event_sync(conn: &Connection, event: &Event) -> Result<usize> {
    let rows = conn.execute(
        r#"INSERT INTO events (
            id, site_id, event_type, url, referrer, utm_source, user_agent,
            language, screen_width, screen_height, session_id, ip_address, country,
            created_at
        )
        SELECT
            ?1::VARCHAR, ?2::VARCHAR, ?3::VARCHAR, ?4::VARCHAR, ?5::VARCHAR,
            ?6::VARCHAR, ?7::VARCHAR, ?8::VARCHAR, ?9::INTEGER, ?10::INTEGER,
            ?11::VARCHAR, ?12::VARCHAR, ?13::VARCHAR, CAST(?14 AS TIMESTAMP)
        WHERE EXISTS (SELECT 1 FROM sites WHERE site_id = ?15::VARCHAR)"#,
        duckdb::params![
            event.id,
            event.site_id,
            event.event_type,
            event.url,
            event.referrer,
            event.utm_source,
            event.user_agent,
            event.language,
            event.screen_width,
            event.screen_height,
            event.session_id,
            event.ip_address,
            event.country,
            sql_timestamp(&event.timestamp),
            event.site_id,
        ],
    )?;
    Ok(rows)
}
