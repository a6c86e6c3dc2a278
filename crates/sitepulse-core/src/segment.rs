use crate::event::Event;

/// Optional narrowing of an event set before aggregation.
///
/// `services` is an allow-list of UTM sources (case-insensitive exact match),
/// `posts` an allow-list of URL prefixes. Each list is OR'd internally; the two
/// lists are AND'd together. An empty list does not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    services: Vec<String>,
    posts: Vec<String>,
}

impl Segment {
    /// Parse the comma-separated `services` and `posts` query parameters.
    pub fn parse(services: Option<&str>, posts: Option<&str>) -> Self {
        Self {
            services: split_tokens(services)
                .map(|s| s.to_lowercase())
                .collect(),
            posts: split_tokens(posts).map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.posts.is_empty()
    }

    pub fn matches(&self, event: &Event) -> bool {
        let service_ok = self.services.is_empty()
            || event.utm_source.as_deref().is_some_and(|source| {
                let source = source.trim().to_lowercase();
                self.services.iter().any(|s| *s == source)
            });
        let post_ok =
            self.posts.is_empty() || self.posts.iter().any(|p| event.url.starts_with(p.as_str()));
        service_ok && post_ok
    }

    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        if self.is_empty() {
            return events;
        }
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}

fn split_tokens(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
