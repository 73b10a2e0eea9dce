//! # roata-protocol
//!
//! Bus-side protocol for Roata: topic families, event payloads and the codec
//! that turns a raw `(topic, payload)` pair into a typed [`Event`].
//!
//! ## Topic families
//!
//! - `telemetry/route/{route_id}` - vehicle position on a route
//! - `event/route/{route_id}` - vehicle removed from a route
//! - `telemetry/transport/{tracker_id}` - vehicle position without a route
//! - `state/station/{station_id}` - station ETA state (recognized, not acted on)
//!
//! ## Example
//!
//! ```rust
//! use roata_protocol::{codec, Event};
//!
//! let payload = br#"{"tracker_id": "T1"}"#;
//! let event = codec::decode("event/route/30", payload).unwrap();
//! assert!(matches!(event, Event::Removal(_)));
//! ```

pub mod codec;
pub mod events;
pub mod time_format;
pub mod topic;
pub mod version;

pub use codec::{decode, encode, ProtocolError};
pub use events::{Event, RemovalEvent, TelemetryEvent, ValidationError};
pub use topic::{TopicFamily, DEFAULT_TOPICS};
pub use version::{PROTOCOL_VERSION, SERVICE_VERSION};
