//! Read-only aggregations over a filtered event set.
//!
//! Every function here is pure: it takes events already scoped to one site,
//! one window and one segment, and returns a serializable report.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

pub mod breakdown;
pub mod kpi;
pub mod pages;
pub mod sessions;

pub use breakdown::{browsers, devices, geography, source_key, sources};
pub use kpi::{kpis, percent_change, KpiChange, KpiReport, KpiSnapshot};
pub use pages::{page_views, PageViewReport};
pub use sessions::{new_vs_returning, session_metrics, sessionize, NewVsReturningReport, SessionReport};

/// UTC calendar day of `ts`, formatted `YYYY-MM-DD`.
pub(crate) fn day_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Sort `(label, count)` pairs by count descending, then label ascending.
pub(crate) fn ranked(counts: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut rows: Vec<(String, u64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}
