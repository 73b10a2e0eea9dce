//! Codec for bus payloads.
//!
//! Payloads are JSON objects. The topic decides which payload shape is
//! expected and supplies the key (route id or tracker id) the payload omits.

use bytes::Bytes;
use thiserror::Error;
use tracing::trace;

use crate::events::{
    Event, RemovalEvent, RemovalPayload, TelemetryEvent, TelemetryPayload, ValidationError,
};
use crate::topic::{self, TopicFamily};

/// Maximum accepted payload size (64 KiB).
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

/// Reasons a message on a recognized topic cannot be turned into an event.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload exceeds the maximum size.
    #[error("Payload size {0} exceeds maximum {MAX_PAYLOAD_SIZE}")]
    PayloadTooLarge(usize),

    /// Payload is not JSON or lacks a required field.
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The topic key is unusable.
    #[error("Invalid topic key: {0}")]
    InvalidTopic(&'static str),

    /// A decoded field is out of range.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The event cannot be published on any topic.
    #[error("Event has no topic")]
    NoTopic,
}

/// Decode a message into an event.
///
/// Topics outside every known family, and families this service does not act
/// on, decode to [`Event::Unrecognized`].
///
/// # Errors
///
/// Returns an error if the payload on a recognized topic is too large, is not
/// JSON, is missing a required field, or carries out-of-range values.
pub fn decode(topic: &str, payload: &[u8]) -> Result<Event, ProtocolError> {
    let Some(parsed) = topic::classify(topic) else {
        trace!(topic = %topic, "Unrecognized topic");
        return Ok(Event::Unrecognized);
    };

    if parsed.family == TopicFamily::Station {
        trace!(topic = %topic, "Ignoring station state");
        return Ok(Event::Unrecognized);
    }

    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }
    topic::validate_key(parsed.key).map_err(ProtocolError::InvalidTopic)?;

    let event = match parsed.family {
        TopicFamily::RouteTelemetry => {
            let body: TelemetryPayload = serde_json::from_slice(payload)?;
            let tracker_id = body.tracker_id.clone().ok_or_else(|| {
                <serde_json::Error as serde::de::Error>::missing_field("tracker_id")
            })?;
            Event::Telemetry(telemetry_from(body, Some(parsed.key.to_string()), tracker_id))
        }
        TopicFamily::TrackerTelemetry => {
            let body: TelemetryPayload = serde_json::from_slice(payload)?;
            Event::Telemetry(telemetry_from(body, None, parsed.key.to_string()))
        }
        TopicFamily::RouteEvent => {
            let body: RemovalPayload = serde_json::from_slice(payload)?;
            let event = RemovalEvent::new(parsed.key, body.tracker_id);
            event.validate()?;
            Event::Removal(event)
        }
        TopicFamily::Station => Event::Unrecognized,
    };

    if let Event::Telemetry(telemetry) = &event {
        telemetry.validate()?;
    }

    Ok(event)
}

/// Encode an event as a `(topic, payload)` pair ready for publishing.
///
/// Telemetry without a timestamp is stamped with the current time, since the
/// wire format requires one.
///
/// # Errors
///
/// Returns an error for [`Event::Unrecognized`] or if serialization fails.
pub fn encode(event: &Event) -> Result<(String, Bytes), ProtocolError> {
    let topic = event.topic().ok_or(ProtocolError::NoTopic)?;

    let payload = match event {
        Event::Telemetry(telemetry) => serde_json::to_vec(&TelemetryPayload {
            tracker_id: telemetry
                .route_id
                .as_ref()
                .map(|_| telemetry.tracker_id.clone()),
            board: telemetry.board.clone(),
            latitude: telemetry.latitude,
            longitude: telemetry.longitude,
            direction: telemetry.direction,
            speed: telemetry.speed,
            timestamp: telemetry.timestamp.unwrap_or_else(chrono::Utc::now),
        })?,
        Event::Removal(removal) => serde_json::to_vec(&RemovalPayload {
            tracker_id: removal.tracker_id.clone(),
        })?,
        Event::Unrecognized => return Err(ProtocolError::NoTopic),
    };

    Ok((topic, Bytes::from(payload)))
}

fn telemetry_from(
    body: TelemetryPayload,
    route_id: Option<String>,
    tracker_id: String,
) -> TelemetryEvent {
    TelemetryEvent {
        route_id,
        tracker_id,
        board: body.board,
        latitude: body.latitude,
        longitude: body.longitude,
        direction: body.direction,
        speed: body.speed,
        timestamp: Some(body.timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_format;

    const TELEMETRY: &[u8] = br#"{
        "tracker_id": "T1",
        "latitude": 47.0,
        "longitude": 28.8,
        "direction": 90,
        "speed": 20,
        "timestamp": "2024-01-01T10:00:00Z"
    }"#;

    #[test]
    fn test_decode_route_telemetry() {
        let event = decode("telemetry/route/30", TELEMETRY).unwrap();
        let Event::Telemetry(telemetry) = event else {
            panic!("Expected telemetry, got {:?}", event);
        };
        assert_eq!(telemetry.route_id.as_deref(), Some("30"));
        assert_eq!(telemetry.tracker_id, "T1");
        assert_eq!(telemetry.speed, 20.0);
        assert_eq!(telemetry.direction, 90.0);
        assert!(telemetry.board.is_none());
        assert_eq!(
            telemetry.timestamp,
            Some(time_format::parse("2024-01-01T10:00:00Z").unwrap())
        );
    }

    #[test]
    fn test_decode_tracker_telemetry_takes_id_from_topic() {
        let payload = br#"{"latitude": 1.0, "longitude": 2.0, "direction": 0, "speed": 0,
            "timestamp": "2024-01-01T10:00:00Z", "board": "3913"}"#;
        let event = decode("telemetry/transport/RTU-7", payload).unwrap();
        let Event::Telemetry(telemetry) = event else {
            panic!("Expected telemetry, got {:?}", event);
        };
        assert!(telemetry.route_id.is_none());
        assert_eq!(telemetry.tracker_id, "RTU-7");
        assert_eq!(telemetry.board.as_deref(), Some("3913"));
    }

    #[test]
    fn test_decode_removal() {
        let event = decode("event/route/30", br#"{"tracker_id": "T1"}"#).unwrap();
        assert_eq!(event, Event::Removal(RemovalEvent::new("30", "T1")));
    }

    #[test]
    fn test_decode_unrecognized_topics() {
        assert_eq!(decode("weather/today", b"not json").unwrap(), Event::Unrecognized);
        assert_eq!(decode("state/station/4", b"{}").unwrap(), Event::Unrecognized);
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            decode("telemetry/route/30", b"\x00\x01garbage"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode("telemetry/route/30", br#"{"tracker_id": "T1", "latitude": 47.0}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode("event/route/30", br#"{"speed": 3}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode("telemetry/route/", TELEMETRY),
            Err(ProtocolError::InvalidTopic(_))
        ));
    }

    #[test]
    fn test_decode_missing_tracker_id_on_route_topic() {
        let payload = br#"{"latitude": 1.0, "longitude": 2.0, "direction": 0, "speed": 0,
            "timestamp": "2024-01-01T10:00:00Z"}"#;
        assert!(matches!(
            decode("telemetry/route/30", payload),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_bad_timestamp() {
        let payload = br#"{"tracker_id": "T1", "latitude": 1.0, "longitude": 2.0,
            "direction": 0, "speed": 0, "timestamp": "2024-01-01T10:00:00.5Z"}"#;
        assert!(matches!(
            decode("telemetry/route/30", payload),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_out_of_range() {
        let payload = br#"{"tracker_id": "T1", "latitude": 1.0, "longitude": 2.0,
            "direction": 0, "speed": -4, "timestamp": "2024-01-01T10:00:00Z"}"#;
        assert!(matches!(
            decode("telemetry/route/30", payload),
            Err(ProtocolError::Invalid(ValidationError::OutOfRange("speed")))
        ));
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![b' '; MAX_PAYLOAD_SIZE + 1];
        assert!(matches!(
            decode("event/route/30", &payload),
            Err(ProtocolError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_encode_then_decode() {
        let timestamp = time_format::parse("2024-01-01T10:00:00Z").unwrap();
        let event = Event::Telemetry(
            TelemetryEvent::new("30", "T1", 47.0, 28.8, 90.0, 20.0)
                .with_timestamp(timestamp)
                .with_board("3913"),
        );

        let (topic, payload) = encode(&event).unwrap();
        assert_eq!(topic, "telemetry/route/30");
        assert_eq!(decode(&topic, &payload).unwrap(), event);

        assert!(matches!(encode(&Event::Unrecognized), Err(ProtocolError::NoTopic)));
    }
}
