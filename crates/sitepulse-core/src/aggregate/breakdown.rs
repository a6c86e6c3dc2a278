use std::collections::HashMap;

use serde::Serialize;

use super::ranked;
use crate::{
    classify::{DeviceClass, UserAgentClassifier},
    event::Event,
};

pub const DIRECT: &str = "direct";
pub const REFERRAL: &str = "referral";
pub const UNKNOWN_COUNTRY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCount {
    pub device: DeviceClass,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserCount {
    pub browser: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

/// Traffic-source key for one event.
///
/// Lowercased UTM source first, then the referrer host, then `"referral"` for
/// a referrer that is not an absolute URL, then `"direct"`.
pub fn source_key(event: &Event) -> String {
    if let Some(source) = event.utm_source.as_deref().map(str::trim) {
        if !source.is_empty() {
            return source.to_lowercase();
        }
    }
    match event.referrer.as_deref().map(str::trim) {
        None | Some("") => DIRECT.to_string(),
        Some(referrer) => url::Url::parse(referrer)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| REFERRAL.to_string()),
    }
}

pub fn sources(events: &[Event]) -> Vec<SourceCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for event in events {
        *counts.entry(source_key(event)).or_default() += 1;
    }
    ranked(counts)
        .into_iter()
        .map(|(source, count)| SourceCount { source, count })
        .collect()
}

/// Device breakdown. All categories are present, zero counts included.
pub fn devices(events: &[Event], classifier: &dyn UserAgentClassifier) -> Vec<DeviceCount> {
    let mut counts: HashMap<DeviceClass, u64> = HashMap::new();
    for event in events {
        *counts
            .entry(classifier.device(event.user_agent.as_deref()))
            .or_default() += 1;
    }
    let mut rows: Vec<DeviceCount> = DeviceClass::ALL
        .iter()
        .map(|device| DeviceCount {
            device: *device,
            count: counts.get(device).copied().unwrap_or(0),
        })
        .collect();
    // Stable sort keeps the fixed category order for ties.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

pub fn browsers(events: &[Event], classifier: &dyn UserAgentClassifier) -> Vec<BrowserCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for event in events {
        let family = classifier.browser(event.user_agent.as_deref());
        *counts.entry(family.as_str().to_string()).or_default() += 1;
    }
    ranked(counts)
        .into_iter()
        .map(|(browser, count)| BrowserCount { browser, count })
        .collect()
}

pub fn geography(events: &[Event]) -> Vec<CountryCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for event in events {
        let country = event
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_COUNTRY);
        *counts.entry(country.to_string()).or_default() += 1;
    }
    ranked(counts)
        .into_iter()
        .map(|(country, count)| CountryCount { country, count })
        .collect()
}
