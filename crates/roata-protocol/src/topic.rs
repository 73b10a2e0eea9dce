//! Topic families for Roata.
//!
//! Topics are `/`-separated. Every recognized family is a fixed two-segment
//! prefix followed by a single trailing segment carrying the key (a route id
//! or a tracker id, depending on the family).

/// Maximum length of a topic key (route id, tracker id, station id).
pub const MAX_KEY_LENGTH: usize = 256;

/// Subscription pattern for per-route telemetry.
pub const ROUTE_TELEMETRY: &str = "telemetry/route/+";

/// Subscription pattern for route membership events.
pub const ROUTE_EVENT: &str = "event/route/+";

/// Subscription pattern for per-tracker telemetry.
pub const TRACKER_TELEMETRY: &str = "telemetry/transport/+";

/// Subscription pattern for station ETA state.
pub const STATION_STATE: &str = "state/station/+";

/// Patterns subscribed to when nothing else is configured.
pub const DEFAULT_TOPICS: [&str; 2] = [ROUTE_TELEMETRY, ROUTE_EVENT];

/// A recognized topic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicFamily {
    /// Position updates for a vehicle serving a route, keyed by route id.
    RouteTelemetry,
    /// Route membership changes, keyed by route id.
    RouteEvent,
    /// Position updates keyed by tracker id, without route information.
    TrackerTelemetry,
    /// Station ETA state, keyed by station id.
    Station,
}

impl TopicFamily {
    /// The fixed prefix shared by every topic of this family.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            TopicFamily::RouteTelemetry => "telemetry/route",
            TopicFamily::RouteEvent => "event/route",
            TopicFamily::TrackerTelemetry => "telemetry/transport",
            TopicFamily::Station => "state/station",
        }
    }

    /// Build a concrete topic for this family.
    #[must_use]
    pub fn topic(self, key: &str) -> String {
        format!("{}/{}", self.prefix(), key)
    }

    const ALL: [TopicFamily; 4] = [
        TopicFamily::RouteTelemetry,
        TopicFamily::RouteEvent,
        TopicFamily::TrackerTelemetry,
        TopicFamily::Station,
    ];
}

/// A topic split into its family and trailing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic<'a> {
    /// The family the topic belongs to.
    pub family: TopicFamily,
    /// The trailing segment.
    pub key: &'a str,
}

/// Split a topic into family and key.
///
/// Returns `None` for topics outside every known family. The key is returned
/// as-is; use [`validate_key`] before trusting it.
#[must_use]
pub fn classify(topic: &str) -> Option<Topic<'_>> {
    let (prefix, key) = topic.rsplit_once('/')?;
    let family = TopicFamily::ALL
        .into_iter()
        .find(|family| family.prefix() == prefix)?;
    Some(Topic { family, key })
}

/// Validate a topic key.
///
/// # Errors
///
/// Returns an error message if the key is empty, too long or contains
/// characters that cannot appear in a single topic segment.
pub fn validate_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("Topic key cannot be empty");
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err("Topic key too long");
    }
    if key.contains(&['/', '+', '#'][..]) {
        return Err("Topic key contains wildcard or separator characters");
    }
    if key.chars().any(char::is_control) {
        return Err("Topic key contains control characters");
    }
    Ok(())
}

/// Check a topic against a subscription pattern.
///
/// `+` matches exactly one segment and a trailing `#` matches any number of
/// remaining segments, including none.
#[must_use]
pub fn matches(pattern: &str, topic: &str) -> bool {
    let mut topic_segments = topic.split('/');

    for expected in pattern.split('/') {
        if expected == "#" {
            return true;
        }
        match topic_segments.next() {
            Some(actual) if expected == "+" || expected == actual => {}
            _ => return false,
        }
    }

    topic_segments.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_families() {
        let topic = classify("telemetry/route/30").unwrap();
        assert_eq!(topic.family, TopicFamily::RouteTelemetry);
        assert_eq!(topic.key, "30");

        let topic = classify("event/route/30A").unwrap();
        assert_eq!(topic.family, TopicFamily::RouteEvent);
        assert_eq!(topic.key, "30A");

        let topic = classify("telemetry/transport/T1").unwrap();
        assert_eq!(topic.family, TopicFamily::TrackerTelemetry);

        let topic = classify("state/station/17").unwrap();
        assert_eq!(topic.family, TopicFamily::Station);
    }

    #[test]
    fn test_classify_unknown_topics() {
        assert!(classify("telemetry/bus/30").is_none());
        assert!(classify("telemetry").is_none());
        assert!(classify("telemetry/route/30/extra").is_none());
        assert!(classify("").is_none());
    }

    #[test]
    fn test_family_topic() {
        assert_eq!(TopicFamily::RouteEvent.topic("5"), "event/route/5");
        assert!(matches(ROUTE_TELEMETRY, &TopicFamily::RouteTelemetry.topic("5")));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("30").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("a+b").is_err());
        assert!(validate_key(&"a".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_pattern_matching() {
        assert!(matches("telemetry/route/+", "telemetry/route/30"));
        assert!(!matches("telemetry/route/+", "telemetry/route/30/x"));
        assert!(!matches("telemetry/route/+", "telemetry/route"));
        assert!(!matches("telemetry/route/+", "event/route/30"));
        assert!(matches("telemetry/#", "telemetry/route/30"));
        assert!(matches("telemetry/#", "telemetry"));
        assert!(matches("event/route/30", "event/route/30"));
    }
}
