//! Transport abstraction traits for Roata.
//!
//! These traits define what the ingestion worker needs from a message bus,
//! so the server does not depend on any particular bus client.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// A raw message as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// `/`-separated topic the message was published on.
    pub topic: String,
    /// Undecoded payload.
    pub payload: Bytes,
}

impl InboundMessage {
    /// Create a new inbound message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Failed to connect to the bus.
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// The pattern is not a valid subscription pattern.
    #[error("Invalid topic pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The bus refused the subscription.
    #[error("Subscribe to {pattern} failed: {reason}")]
    SubscribeFailed {
        /// The pattern being subscribed.
        pattern: String,
        /// Error reported by the bus client.
        reason: String,
    },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// A message bus the ingestion worker reads from.
///
/// Messages are received one at a time, in the order the bus delivers them.
#[async_trait]
pub trait Transport: Send {
    /// Register interest in a topic pattern.
    async fn subscribe(&mut self, pattern: &str) -> Result<(), TransportError>;

    /// Receive the next message.
    ///
    /// Returns `None` once the bus will deliver nothing more.
    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError>;

    /// Get the transport name (e.g., "nats", "memory").
    fn name(&self) -> &'static str;
}

/// Validate a subscription pattern.
///
/// # Errors
///
/// Returns an error if the pattern is empty, has empty segments, uses a
/// wildcard inside a segment, or has `#` anywhere but the last segment.
pub fn validate_pattern(pattern: &str) -> Result<(), TransportError> {
    let invalid = |reason| TransportError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    if pattern.is_empty() {
        return Err(invalid("Pattern cannot be empty"));
    }

    let segments: Vec<&str> = pattern.split('/').collect();
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(invalid("Pattern contains an empty segment"));
        }
        if *segment == "#" && index + 1 != segments.len() {
            return Err(invalid("'#' is only allowed as the last segment"));
        }
        if segment.len() > 1 && segment.contains(&['+', '#'][..]) {
            return Err(invalid("Wildcards must fill a whole segment"));
        }
    }
    Ok(())
}
