//! In-process transport.
//!
//! Behaves like a broker with a single subscriber: published messages are
//! delivered in publish order, filtered by the patterns subscribed so far.

use async_trait::async_trait;
use bytes::Bytes;
use roata_protocol::{codec, topic, Event};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::traits::{validate_pattern, InboundMessage, Transport, TransportError};

/// Create a connected publisher/transport pair.
#[must_use]
pub fn channel() -> (MemoryPublisher, MemoryTransport) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        MemoryPublisher { sender },
        MemoryTransport {
            patterns: Vec::new(),
            receiver,
        },
    )
}

/// Publishing half of the in-process bus.
#[derive(Debug, Clone)]
pub struct MemoryPublisher {
    sender: mpsc::UnboundedSender<InboundMessage>,
}

impl MemoryPublisher {
    /// Publish a raw payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport has been dropped.
    pub fn publish(
        &self,
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Result<(), TransportError> {
        self.sender
            .send(InboundMessage::new(topic, payload))
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Encode and publish an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or the transport has
    /// been dropped.
    pub fn publish_event(&self, event: &Event) -> Result<(), TransportError> {
        let (topic, payload) =
            codec::encode(event).map_err(|e| TransportError::Other(e.to_string()))?;
        self.publish(topic, payload)
    }
}

/// Receiving half of the in-process bus.
#[derive(Debug)]
pub struct MemoryTransport {
    patterns: Vec<String>,
    receiver: mpsc::UnboundedReceiver<InboundMessage>,
}

impl MemoryTransport {
    /// Patterns subscribed so far.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn is_subscribed(&self, topic: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| topic::matches(pattern, topic))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn subscribe(&mut self, pattern: &str) -> Result<(), TransportError> {
        validate_pattern(pattern)?;
        if !self.patterns.iter().any(|p| p == pattern) {
            self.patterns.push(pattern.to_string());
            debug!(pattern = %pattern, "Subscribed");
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        while let Some(message) = self.receiver.recv().await {
            if self.is_subscribed(&message.topic) {
                return Ok(Some(message));
            }
            trace!(topic = %message.topic, "Dropping message with no matching subscription");
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
