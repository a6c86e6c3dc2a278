use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sitepulse_core::analytics::AnalyticsBackend;
use sitepulse_core::event::Event;
use sitepulse_core::window::Window;

use crate::DuckDbBackend;

#[async_trait]
impl AnalyticsBackend for DuckDbBackend {
    async fn insert_event(&self, event: &Event) -> anyhow::Result<bool> {
        DuckDbBackend::insert_event(self, event).await
    }

    async fn events_in_window(
        &self,
        site_id: &str,
        window: &Window,
    ) -> anyhow::Result<Vec<Event>> {
        DuckDbBackend::events_in_window(self, site_id, window).await
    }

    async fn session_first_seen(
        &self,
        site_id: &str,
        window: &Window,
    ) -> anyhow::Result<HashMap<String, DateTime<Utc>>> {
        DuckDbBackend::session_first_seen(self, site_id, window).await
    }
}
