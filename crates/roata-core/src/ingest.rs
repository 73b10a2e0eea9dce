//! Ingestion path: decode a bus message and apply it to the store.
//!
//! Nothing on this path propagates an error. Every message ends in exactly
//! one [`IngestOutcome`], and the caller moves on to the next message.

use crate::store::{ApplyOutcome, StateStore, StoreError};
use roata_protocol::{codec, Event, ProtocolError};
use tracing::{debug, warn};

/// How a single message was handled.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The event was applied.
    Applied(ApplyOutcome),
    /// The topic is not one this service acts on.
    Ignored,
    /// The payload could not be decoded.
    Dropped(ProtocolError),
    /// The decoded event was rejected by the store.
    Rejected(StoreError),
}

impl IngestOutcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Applied(_) => "applied",
            IngestOutcome::Ignored => "ignored",
            IngestOutcome::Dropped(_) => "dropped",
            IngestOutcome::Rejected(_) => "rejected",
        }
    }
}

/// Handle one inbound message.
pub fn on_message(store: &StateStore, topic: &str, payload: &[u8]) -> IngestOutcome {
    let event = match codec::decode(topic, payload) {
        Ok(Event::Unrecognized) => return IngestOutcome::Ignored,
        Ok(event) => event,
        Err(e) => {
            debug!(
                topic = %topic,
                error = %e,
                payload = ?String::from_utf8_lossy(payload),
                "Ignoring bad message"
            );
            return IngestOutcome::Dropped(e);
        }
    };

    match store.apply(&event) {
        Ok(outcome) => IngestOutcome::Applied(outcome),
        Err(e) => {
            warn!(topic = %topic, kind = event.kind(), error = %e, "Event rejected by store");
            IngestOutcome::Rejected(e)
        }
    }
}
