//! Date-range resolution for dashboard requests.
//!
//! A request may name an explicit `start`/`end` pair, a preset, or a trailing
//! day count. Malformed values never fail the request; they fall through to
//! the next rule and finally to the last 30 days.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;

pub const DEFAULT_DAYS: i64 = 30;

/// A `[since, until]` time range, compared inclusively at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl Window {
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { since, until }
    }

    pub fn length(&self) -> Duration {
        self.until - self.since
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.since && ts <= self.until
    }

    /// The equal-length window immediately preceding this one.
    pub fn comparison(&self) -> Window {
        Window {
            since: self.since - self.length(),
            until: self.since,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Last7d,
    Last14d,
    Last30d,
    ThisMonth,
    LastMonth,
}

impl Preset {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "last_7d" => Some(Self::Last7d),
            "last_14d" => Some(Self::Last14d),
            "last_30d" => Some(Self::Last30d),
            "this_month" => Some(Self::ThisMonth),
            "last_month" => Some(Self::LastMonth),
            _ => None,
        }
    }

    pub fn window(self, now: DateTime<Utc>) -> Window {
        match self {
            Self::Last7d => Window::new(now - Duration::days(7), now),
            Self::Last14d => Window::new(now - Duration::days(14), now),
            Self::Last30d => Window::new(now - Duration::days(30), now),
            Self::ThisMonth => Window::new(month_start(now.date_naive()), now),
            Self::LastMonth => {
                let this_month = month_start(now.date_naive());
                let previous = month_start((this_month - Duration::days(1)).date_naive());
                Window::new(previous, this_month - Duration::seconds(1))
            }
        }
    }
}

/// Raw range parameters as they arrive on the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeRequest<'a> {
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub preset: Option<&'a str>,
    pub days: Option<&'a str>,
}

/// Resolve a request into a concrete window as of `now`.
pub fn resolve(request: &RangeRequest<'_>, now: DateTime<Utc>) -> Window {
    let explicit = (
        request.start.and_then(parse_instant),
        request.end.and_then(parse_instant),
    );
    if let (Some(since), Some(until)) = explicit {
        return Window::new(since, until);
    }

    if let Some(preset) = request.preset.and_then(Preset::parse) {
        return preset.window(now);
    }

    trailing_days(now, parse_days(request.days))
}

/// Parse an ISO-8601 instant: RFC 3339, naive date-time (UTC) or plain date
/// (midnight UTC).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn parse_days(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_DAYS)
}

fn trailing_days(now: DateTime<Utc>, days: i64) -> Window {
    let since = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or_else(|| now - Duration::days(DEFAULT_DAYS));
    Window::new(since, now)
}

fn month_start(date: NaiveDate) -> DateTime<Utc> {
    date.with_day(1)
        .unwrap_or(date)
        .and_time(NaiveTime::MIN)
        .and_utc()
}
