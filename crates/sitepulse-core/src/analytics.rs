//! Event store abstraction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{event::Event, window::Window};

/// Read/write access to the append-only event store.
///
/// Route handlers only depend on this trait; the DuckDB backend implements it
/// and tests can substitute their own.
#[async_trait::async_trait]
pub trait AnalyticsBackend: Send + Sync + 'static {
    /// Store `event` if its site is registered. Returns `false` when the
    /// site is unknown and nothing was stored.
    async fn insert_event(&self, event: &Event) -> anyhow::Result<bool>;

    /// All events of `site_id` with `window.since <= timestamp <= window.until`,
    /// oldest first.
    async fn events_in_window(&self, site_id: &str, window: &Window)
        -> anyhow::Result<Vec<Event>>;

    /// For every session with at least one event in `window`, the timestamp of
    /// that session's first event across all time.
    async fn session_first_seen(
        &self,
        site_id: &str,
        window: &Window,
    ) -> anyhow::Result<HashMap<String, DateTime<Utc>>>;
}
