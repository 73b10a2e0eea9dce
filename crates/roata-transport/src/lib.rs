//! # roata-transport
//!
//! Message bus abstraction for Roata.
//!
//! The ingestion worker only needs two things from a bus: register interest
//! in topic patterns, and receive `(topic, payload)` pairs one at a time.
//!
//! - **NATS** - production bus client
//! - **Memory** - in-process bus for tests and local runs
//!
//! Topics use `/` separators with `+` (one segment) and `#` (trailing
//! remainder) wildcards, whatever the underlying bus calls them.
//!
//! ```rust,ignore
//! use roata_transport::Transport;
//!
//! async fn drain(mut transport: Box<dyn Transport>) {
//!     while let Ok(Some(message)) = transport.recv().await {
//!         // Decode and apply
//!     }
//! }
//! ```

pub mod memory;
pub mod traits;

#[cfg(feature = "nats")]
pub mod nats;

pub use memory::{MemoryPublisher, MemoryTransport};
pub use traits::{validate_pattern, InboundMessage, Transport, TransportError};

#[cfg(feature = "nats")]
pub use nats::{NatsConfig, NatsTransport};
