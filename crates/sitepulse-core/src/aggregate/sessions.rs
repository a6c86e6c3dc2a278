use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::day_key;
use crate::{event::Event, window::Window};

/// One session reconstructed from its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `end - start` in whole seconds.
    pub duration: i64,
    pub events: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySessions {
    pub date: String,
    pub sessions: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_count: u64,
    pub avg_duration_seconds: f64,
    pub trend: Vec<DaySessions>,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayNewVsReturning {
    pub date: String,
    pub new_sessions: u64,
    pub returning_sessions: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVsReturningReport {
    pub new: u64,
    pub returning: u64,
    pub daily: Vec<DayNewVsReturning>,
}

/// Group events by `session_id`. Most recently started sessions come first.
pub fn sessionize(events: &[Event]) -> Vec<SessionSummary> {
    let mut by_id: HashMap<&str, SessionSummary> = HashMap::new();
    for event in events {
        by_id
            .entry(event.session_id.as_str())
            .and_modify(|s| {
                s.start = s.start.min(event.timestamp);
                s.end = s.end.max(event.timestamp);
                s.events += 1;
            })
            .or_insert_with(|| SessionSummary {
                session_id: event.session_id.clone(),
                start: event.timestamp,
                end: event.timestamp,
                duration: 0,
                events: 1,
            });
    }

    let mut sessions: Vec<SessionSummary> = by_id
        .into_values()
        .map(|mut s| {
            s.duration = (s.end - s.start).num_seconds();
            s
        })
        .collect();
    sessions.sort_by(|a, b| {
        b.start
            .cmp(&a.start)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    sessions
}

pub fn session_metrics(events: &[Event]) -> SessionReport {
    let sessions = sessionize(events);
    let session_count = sessions.len() as u64;
    let total_duration: i64 = sessions.iter().map(|s| s.duration).sum();
    let avg_duration_seconds = if session_count == 0 {
        0.0
    } else {
        total_duration as f64 / session_count as f64
    };

    let mut per_day: BTreeMap<String, u64> = BTreeMap::new();
    for session in &sessions {
        *per_day.entry(day_key(session.start)).or_default() += 1;
    }

    SessionReport {
        session_count,
        avg_duration_seconds,
        trend: per_day
            .into_iter()
            .map(|(date, sessions)| DaySessions { date, sessions })
            .collect(),
        sessions,
    }
}

/// Split the sessions seen in `window` into new and returning.
///
/// `first_seen` holds each session's first event across all time. A session
/// missing from it falls back to its earliest event in `events`.
pub fn new_vs_returning(
    events: &[Event],
    first_seen: &HashMap<String, DateTime<Utc>>,
    window: &Window,
) -> NewVsReturningReport {
    let mut earliest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    let mut per_day: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for event in events {
        let id = event.session_id.as_str();
        earliest
            .entry(id)
            .and_modify(|ts| *ts = (*ts).min(event.timestamp))
            .or_insert(event.timestamp);
        per_day
            .entry(day_key(event.timestamp))
            .or_default()
            .insert(id);
    }

    let first_of = |id: &str| -> Option<DateTime<Utc>> {
        first_seen
            .get(id)
            .copied()
            .or_else(|| earliest.get(id).copied())
    };

    let (mut new, mut returning) = (0, 0);
    for id in earliest.keys() {
        if first_of(*id).is_some_and(|ts| window.contains(ts)) {
            new += 1;
        } else {
            returning += 1;
        }
    }

    let daily = per_day
        .into_iter()
        .map(|(date, ids)| {
            let new_sessions = ids
                .iter()
                .filter(|id| first_of(**id).is_some_and(|ts| ts >= window.since))
                .count() as u64;
            DayNewVsReturning {
                date,
                new_sessions,
                returning_sessions: ids.len() as u64 - new_sessions,
            }
        })
        .collect();

    NewVsReturningReport {
        new,
        returning,
        daily,
    }
}
