use sitepulse_core::classify::{BrowserFamily, DeviceClass, UserAgentClassifier};

/// Parser-backed classification via the `woothee` crate.
///
/// Selected with `SITEPULSE_UA_CLASSIFIER=woothee`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WootheeClassifier;

impl UserAgentClassifier for WootheeClassifier {
    fn device(&self, user_agent: Option<&str>) -> DeviceClass {
        let ua = user_agent.map(str::trim).unwrap_or_default();
        if ua.is_empty() {
            return DeviceClass::Unknown;
        }
        let parser = woothee::parser::Parser::new();
        let Some(result) = parser.parse(ua) else {
            return DeviceClass::Desktop;
        };
        // woothee has no tablet category; iPads report as smartphones.
        match (result.category, result.os) {
            (_, "iPad") => DeviceClass::Tablet,
            ("smartphone" | "mobilephone", _) => DeviceClass::Mobile,
            ("crawler", _) => DeviceClass::Bot,
            _ => DeviceClass::Desktop,
        }
    }

    fn browser(&self, user_agent: Option<&str>) -> BrowserFamily {
        let ua = user_agent.map(str::trim).unwrap_or_default();
        if ua.is_empty() {
            return BrowserFamily::Other;
        }
        let parser = woothee::parser::Parser::new();
        match parser.parse(ua).map(|r| r.name) {
            Some("Chrome") => BrowserFamily::Chrome,
            Some("Firefox") => BrowserFamily::Firefox,
            Some("Safari") => BrowserFamily::Safari,
            Some("Edge") => BrowserFamily::Edge,
            Some("Opera") => BrowserFamily::Opera,
            _ => BrowserFamily::Other,
        }
    }
}
