use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_EVENT_TYPE: &str = "pageview";

/// The payload a tracked page sends to `POST /track/`.
///
/// Every field is optional on the wire so that missing values surface as
/// field-level validation errors instead of opaque deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackPayload {
    pub site_id: Option<String>,
    pub event_type: Option<String>,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    /// ISO-8601 with offset. Receipt time is used when absent or unparseable.
    pub timestamp: Option<String>,
}

/// Request-level facts used to fill gaps in a [`TrackPayload`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub received_at: DateTime<Utc>,
    /// Value of the `User-Agent` header.
    pub user_agent: Option<String>,
    /// First `X-Forwarded-For` entry.
    pub client_ip: Option<String>,
}

/// A stored page view. Mirrors the `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub site_id: String,
    pub event_type: String,
    pub url: String,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub session_id: String,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TrackPayload {
    /// Validate the payload and turn it into an [`Event`] for `site_id`.
    ///
    /// `site_id` must already be resolved to an existing site; the payload's
    /// own `site_id` field is ignored here.
    pub fn into_event(self, site_id: String, ctx: RequestContext) -> Result<Event, CoreError> {
        let url = non_blank(self.url)
            .ok_or_else(|| CoreError::validation("url", "this field is required"))?;
        let session_id = non_blank(self.session_id)
            .ok_or_else(|| CoreError::validation("session_id", "this field is required"))?;

        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(ctx.received_at)
            .trunc_subsecs(6);

        Ok(Event {
            id: uuid::Uuid::new_v4().to_string(),
            site_id,
            event_type: non_blank(self.event_type)
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            url,
            referrer: non_blank(self.referrer),
            utm_source: non_blank(self.utm_source),
            user_agent: non_blank(self.user_agent).or_else(|| non_blank(ctx.user_agent)),
            language: non_blank(self.language),
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            session_id,
            ip_address: non_blank(self.ip_address).or_else(|| non_blank(ctx.client_ip)),
            country: non_blank(self.country),
            timestamp,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
