//! User-agent classification.
//!
//! Aggregators only see the [`UserAgentClassifier`] trait, so the substring
//! heuristic here can be swapped for a parser-backed strategy without touching
//! aggregation code.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
    Tablet,
    Bot,
    Unknown,
}

impl DeviceClass {
    /// Every category, in report order.
    pub const ALL: [DeviceClass; 5] = [
        DeviceClass::Mobile,
        DeviceClass::Desktop,
        DeviceClass::Tablet,
        DeviceClass::Bot,
        DeviceClass::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Bot => "bot",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BrowserFamily {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Opera,
    #[serde(rename = "other")]
    Other,
}

impl BrowserFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Firefox => "Firefox",
            Self::Safari => "Safari",
            Self::Edge => "Edge",
            Self::Opera => "Opera",
            Self::Other => "other",
        }
    }
}

/// Maps a raw `User-Agent` string to a device class and a browser family.
///
/// Both methods are total: every input, including `None`, maps to exactly one
/// category.
pub trait UserAgentClassifier: Send + Sync + 'static {
    fn device(&self, user_agent: Option<&str>) -> DeviceClass;
    fn browser(&self, user_agent: Option<&str>) -> BrowserFamily;
}

/// Lowercase substring rules, evaluated in priority order.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl UserAgentClassifier for HeuristicClassifier {
    fn device(&self, user_agent: Option<&str>) -> DeviceClass {
        let ua = user_agent.unwrap_or_default().trim().to_lowercase();
        if ua.is_empty() {
            DeviceClass::Unknown
        } else if ua.contains("mobile") && !ua.contains("tablet") {
            DeviceClass::Mobile
        } else if ua.contains("tablet") || ua.contains("ipad") {
            DeviceClass::Tablet
        } else if ["bot", "spider", "crawl"].iter().any(|m| ua.contains(m)) {
            DeviceClass::Bot
        } else {
            DeviceClass::Desktop
        }
    }

    fn browser(&self, user_agent: Option<&str>) -> BrowserFamily {
        let ua = user_agent.unwrap_or_default().to_lowercase();
        if ua.contains("chrome") && !ua.contains("edg") && !ua.contains("chromium") {
            BrowserFamily::Chrome
        } else if ua.contains("firefox") {
            BrowserFamily::Firefox
        } else if ua.contains("safari") && !ua.contains("chrome") {
            BrowserFamily::Safari
        } else if ua.contains("edg") {
            // "edge" is covered by the "edg" substring.
            BrowserFamily::Edge
        } else if ua.contains("opr") || ua.contains("opera") {
            BrowserFamily::Opera
        } else {
            BrowserFamily::Other
        }
    }
}
