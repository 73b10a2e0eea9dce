//! Tracker records.
//!
//! A tracker is the latest known state of one vehicle. Fields always hold the
//! most recently received values; updates are not reordered by timestamp.

use chrono::{DateTime, Utc};
use roata_protocol::TelemetryEvent;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A tracker identifier.
pub type TrackerId = String;

/// Latest known state of one vehicle.
///
/// Serializes to the wire shape
/// `{longitude, latitude, direction, board, speed, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    /// Stable vehicle identifier. Carried as the map key on the wire.
    #[serde(skip)]
    pub tracker_id: TrackerId,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Heading in degrees, North = 0, East = 90.
    pub direction: f64,
    /// Display label, usually the number painted on the vehicle.
    #[serde(rename = "board")]
    pub board_name: Option<String>,
    /// Non-negative speed.
    pub speed: f64,
    /// Observation time of the values above.
    #[serde(with = "roata_protocol::time_format")]
    pub timestamp: DateTime<Utc>,
}

impl Tracker {
    /// Create a tracker from its first telemetry report.
    ///
    /// Without an observation time the tracker is stamped with the current
    /// time.
    #[must_use]
    pub fn from_telemetry(event: &TelemetryEvent) -> Self {
        Self {
            tracker_id: event.tracker_id.clone(),
            longitude: event.longitude,
            latitude: event.latitude,
            direction: event.direction,
            board_name: event.board.clone(),
            speed: event.speed,
            timestamp: event.timestamp.unwrap_or_else(Utc::now),
        }
    }

    /// Overwrite mutable fields with a newer report.
    ///
    /// The board name is only replaced when the report carries one.
    pub fn apply(&mut self, event: &TelemetryEvent) {
        self.latitude = event.latitude;
        self.longitude = event.longitude;
        self.direction = event.direction;
        self.speed = event.speed;
        self.timestamp = event.timestamp.unwrap_or_else(Utc::now);
        if let Some(board) = &event.board {
            self.board_name = Some(board.clone());
        }
        trace!(tracker = %self.tracker_id, "Tracker updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roata_protocol::time_format;

    fn report(speed: f64) -> TelemetryEvent {
        TelemetryEvent::new("30", "T1", 47.0, 28.8, 90.0, speed)
            .with_timestamp(time_format::parse("2024-01-01T10:00:00Z").unwrap())
    }

    #[test]
    fn test_from_telemetry() {
        let tracker = Tracker::from_telemetry(&report(20.0).with_board("3913"));
        assert_eq!(tracker.tracker_id, "T1");
        assert_eq!(tracker.speed, 20.0);
        assert_eq!(tracker.board_name.as_deref(), Some("3913"));
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let before = Utc::now();
        let tracker = Tracker::from_telemetry(&TelemetryEvent::new("30", "T1", 0.0, 0.0, 0.0, 0.0));
        assert!(tracker.timestamp >= before);
        assert!(tracker.timestamp <= Utc::now());
    }

    #[test]
    fn test_apply_keeps_board_unless_supplied() {
        let mut tracker = Tracker::from_telemetry(&report(20.0).with_board("3913"));

        tracker.apply(&report(35.0));
        assert_eq!(tracker.speed, 35.0);
        assert_eq!(tracker.board_name.as_deref(), Some("3913"));

        tracker.apply(&report(35.0).with_board("4001"));
        assert_eq!(tracker.board_name.as_deref(), Some("4001"));
    }

    #[test]
    fn test_wire_encoding() {
        let tracker = Tracker::from_telemetry(&report(20.0));
        let json = serde_json::to_value(&tracker).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "longitude": 28.8,
                "latitude": 47.0,
                "direction": 90.0,
                "board": null,
                "speed": 20.0,
                "timestamp": "2024-01-01T10:00:00Z",
            })
        );
    }
}
