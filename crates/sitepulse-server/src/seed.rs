//! Demo data for `sitepulse seed`.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::{seq::SliceRandom, Rng};
use tracing::info;

use sitepulse_core::event::{Event, DEFAULT_EVENT_TYPE};
use sitepulse_duckdb::DuckDbBackend;

pub const DEMO_DOMAIN: &str = "example.com";
pub const DEMO_DAYS: i64 = 60;

const COUNTRIES: &[&str] = &["India", "USA", "Germany", "France", "Brazil", "UK", "Canada"];
const UTM_SOURCES: &[Option<&str>] = &[
    Some("google"),
    Some("twitter"),
    Some("facebook"),
    Some("newsletter"),
    Some("linkedin"),
    None,
];
const REFERRERS: &[Option<&str>] = &[
    Some("https://google.com"),
    Some("https://twitter.com"),
    Some("https://facebook.com"),
    Some("https://news.example.com"),
    None,
];
const DEVICES: &[(&str, i32, i32)] = &[
    ("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Safari/537.36", 1920, 1080),
    ("Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15", 1440, 900),
    ("Mozilla/5.0 (Linux; Android 14; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Mobile Safari/537.36", 390, 844),
    ("Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1", 414, 896),
    ("Mozilla/5.0 (iPad; CPU OS 16_7 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1", 1024, 1366),
];
const URLS: &[&str] = &[
    "/",
    "/page1",
    "/page2",
    "/landing/service-a",
    "/landing/service-b",
    "/blog/page1",
    "/blog/page2",
    "/docs/install",
    "/docs/usage",
];

#[derive(Debug)]
pub struct SeedSummary {
    pub site_id: String,
    pub events: usize,
}

/// Fill `owner`'s demo site with fresh random traffic.
///
/// The site is created on first use. Its previous events are removed first.
pub async fn seed_demo(db: &DuckDbBackend, owner: &str) -> Result<SeedSummary> {
    let existing = db
        .list_sites(owner)
        .await?
        .into_iter()
        .find(|site| site.domain == DEMO_DOMAIN);
    let site = match existing {
        Some(site) => site,
        None => db.create_site(owner, DEMO_DOMAIN).await?,
    };

    let events = demo_events(&site.site_id, Utc::now(), &mut rand::thread_rng());
    let removed = db.replace_site_events(&site.site_id, &events).await?;

    info!(site_id = %site.site_id, removed, inserted = events.len(), "demo data seeded");
    Ok(SeedSummary {
        site_id: site.site_id,
        events: events.len(),
    })
}

/// Generate `DEMO_DAYS` days of sessions ending at `now`.
///
/// Each day gets 15 to 40 sessions; each session gets 1 to 5 page views that
/// share one device, source, referrer and country.
pub fn demo_events<R: Rng>(site_id: &str, now: DateTime<Utc>, rng: &mut R) -> Vec<Event> {
    let mut events = Vec::new();
    for day in 0..DEMO_DAYS {
        let day_anchor = now - Duration::days(day);
        for _ in 0..rng.gen_range(15..=40) {
            let session_id = uuid::Uuid::new_v4().to_string();
            let (ua, width, height) = *DEVICES.choose(rng).unwrap_or(&DEVICES[0]);
            let utm_source = *UTM_SOURCES.choose(rng).unwrap_or(&None);
            let referrer = *REFERRERS.choose(rng).unwrap_or(&None);
            let country = *COUNTRIES.choose(rng).unwrap_or(&COUNTRIES[0]);

            let start_minute: i64 = rng.gen_range(0..=1200);
            for view in 0..rng.gen_range(1..=5i64) {
                let offset = start_minute + view * rng.gen_range(1..=30i64);
                events.push(Event {
                    id: uuid::Uuid::new_v4().to_string(),
                    site_id: site_id.to_string(),
                    event_type: DEFAULT_EVENT_TYPE.to_string(),
                    url: URLS.choose(rng).copied().unwrap_or("/").to_string(),
                    referrer: referrer.map(str::to_string),
                    utm_source: utm_source.map(str::to_string),
                    user_agent: Some(ua.to_string()),
                    language: Some("en-US".to_string()),
                    screen_width: Some(width),
                    screen_height: Some(height),
                    session_id: session_id.clone(),
                    ip_address: Some("127.0.0.1".to_string()),
                    country: Some(country.to_string()),
                    timestamp: day_anchor - Duration::minutes(offset),
                });
            }
        }
    }
    events
}
