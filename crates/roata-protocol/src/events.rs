//! Typed events decoded from bus payloads.
//!
//! Decoding produces exactly one [`Event`] per message. Dispatch on the topic
//! happens once, in the codec; everything downstream matches on the variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topic::TopicFamily;

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required identifier is empty or unusable.
    #[error("Invalid {field}: {reason}")]
    InvalidId {
        /// Name of the identifier field.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A numeric field is outside its allowed range.
    #[error("Field {0} is out of range")]
    OutOfRange(&'static str),
}

/// A position report for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    /// Route the vehicle is serving, when the topic carries one.
    pub route_id: Option<String>,
    /// Vehicle identifier.
    pub tracker_id: String,
    /// Display label, only when the publisher sent one.
    pub board: Option<String>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Heading in degrees, North = 0.
    pub direction: f64,
    /// Non-negative speed.
    pub speed: f64,
    /// Observation time.
    pub timestamp: Option<DateTime<Utc>>,
}

impl TelemetryEvent {
    /// Create a route-tagged telemetry event with no timestamp or board.
    #[must_use]
    pub fn new(
        route_id: impl Into<String>,
        tracker_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        direction: f64,
        speed: f64,
    ) -> Self {
        Self {
            route_id: Some(route_id.into()),
            tracker_id: tracker_id.into(),
            board: None,
            latitude,
            longitude,
            direction,
            speed,
            timestamp: None,
        }
    }

    /// Set the observation time.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the display label.
    #[must_use]
    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }

    /// Check identifiers and numeric ranges.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(route_id) = &self.route_id {
            validate_id("route_id", route_id)?;
        }
        validate_id("tracker_id", &self.tracker_id)?;

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::OutOfRange("latitude"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::OutOfRange("longitude"));
        }
        if !(0.0..=360.0).contains(&self.direction) {
            return Err(ValidationError::OutOfRange("direction"));
        }
        // NaN fails every range check above and here.
        if !(self.speed >= 0.0 && self.speed.is_finite()) {
            return Err(ValidationError::OutOfRange("speed"));
        }
        Ok(())
    }
}

/// A notification that a vehicle no longer serves a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalEvent {
    /// Route the vehicle was removed from.
    pub route_id: String,
    /// Vehicle identifier.
    pub tracker_id: String,
}

impl RemovalEvent {
    /// Create a removal event.
    #[must_use]
    pub fn new(route_id: impl Into<String>, tracker_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            tracker_id: tracker_id.into(),
        }
    }

    /// Check identifiers.
    ///
    /// # Errors
    ///
    /// Returns the first identifier that fails validation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("route_id", &self.route_id)?;
        validate_id("tracker_id", &self.tracker_id)
    }
}

/// A decoded bus message.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Vehicle position update.
    Telemetry(TelemetryEvent),
    /// Vehicle removed from a route.
    Removal(RemovalEvent),
    /// A message this service does not act on.
    Unrecognized,
}

impl Event {
    /// The topic this event would be published on, if it has one.
    #[must_use]
    pub fn topic(&self) -> Option<String> {
        match self {
            Event::Telemetry(event) => Some(match &event.route_id {
                Some(route_id) => TopicFamily::RouteTelemetry.topic(route_id),
                None => TopicFamily::TrackerTelemetry.topic(&event.tracker_id),
            }),
            Event::Removal(event) => Some(TopicFamily::RouteEvent.topic(&event.route_id)),
            Event::Unrecognized => None,
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Telemetry(_) => "telemetry",
            Event::Removal(_) => "removal",
            Event::Unrecognized => "unrecognized",
        }
    }
}

fn validate_id(field: &'static str, id: &str) -> Result<(), ValidationError> {
    crate::topic::validate_key(id).map_err(|reason| ValidationError::InvalidId { field, reason })
}

/// Telemetry payload as it appears on the bus.
///
/// The tracker id is optional on the wire because tracker telemetry carries
/// it in the topic instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TelemetryPayload {
    #[serde(default, alias = "tracker", alias = "rtu_id", skip_serializing_if = "Option::is_none")]
    pub tracker_id: Option<String>,
    #[serde(default, alias = "board_name", skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub direction: f64,
    pub speed: f64,
    #[serde(with = "crate::time_format")]
    pub timestamp: DateTime<Utc>,
}

/// Removal payload as it appears on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RemovalPayload {
    #[serde(alias = "tracker", alias = "rtu_id")]
    pub tracker_id: String,
}
