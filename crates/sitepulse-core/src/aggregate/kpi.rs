use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{breakdown::UNKNOWN_COUNTRY, ranked};
use crate::event::Event;

/// Headline numbers for one window.
///
/// `users` mirrors `sessions`: there is no visitor identity beyond the
/// client-side session id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiSnapshot {
    pub sessions: u64,
    pub users: u64,
    pub page_views: u64,
    pub top_country: String,
}

/// Percent change of each numeric KPI against the comparison window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiChange {
    pub sessions: f64,
    pub users: f64,
    pub page_views: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    #[serde(flatten)]
    pub current: KpiSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<KpiSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<KpiChange>,
}

impl KpiReport {
    pub fn new(current: KpiSnapshot, previous: Option<KpiSnapshot>) -> Self {
        let change = previous.as_ref().map(|prev| KpiChange {
            sessions: percent_change(current.sessions, prev.sessions),
            users: percent_change(current.users, prev.users),
            page_views: percent_change(current.page_views, prev.page_views),
        });
        Self {
            current,
            previous,
            change,
        }
    }
}

/// `((current - previous) / previous) * 100`.
///
/// A zero baseline reports 100 when anything happened and 0 otherwise.
pub fn percent_change(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    (current as f64 - previous as f64) / previous as f64 * 100.0
}

pub fn kpis(events: &[Event]) -> KpiSnapshot {
    let sessions = events
        .iter()
        .map(|e| e.session_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;

    let mut countries: HashMap<String, u64> = HashMap::new();
    for country in events
        .iter()
        .filter_map(|e| e.country.as_deref().map(str::trim))
        .filter(|c| !c.is_empty())
    {
        *countries.entry(country.to_string()).or_default() += 1;
    }
    let top_country = ranked(countries)
        .into_iter()
        .next()
        .map(|(country, _)| country)
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

    KpiSnapshot {
        sessions,
        users: sessions,
        page_views: events.len() as u64,
        top_country,
    }
}
