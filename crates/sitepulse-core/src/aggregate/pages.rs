use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{day_key, ranked};
use crate::event::Event;

pub const TOP_PAGES_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayViews {
    pub date: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageViews {
    pub url: String,
    pub views: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageViewReport {
    pub trend: Vec<DayViews>,
    pub top_pages: Vec<PageViews>,
}

/// Events per day (ascending, days without events omitted) and the ten most
/// viewed URLs.
pub fn page_views(events: &[Event]) -> PageViewReport {
    let mut per_day: BTreeMap<String, u64> = BTreeMap::new();
    let mut per_url: HashMap<String, u64> = HashMap::new();
    for event in events {
        *per_day.entry(day_key(event.timestamp)).or_default() += 1;
        *per_url.entry(event.url.clone()).or_default() += 1;
    }

    PageViewReport {
        trend: per_day
            .into_iter()
            .map(|(date, views)| DayViews { date, views })
            .collect(),
        top_pages: ranked(per_url)
            .into_iter()
            .take(TOP_PAGES_LIMIT)
            .map(|(url, views)| PageViews { url, views })
            .collect(),
    }
}
