//! Ingestion worker.
//!
//! A single task drains the transport and applies messages one at a time, in
//! delivery order. Bad messages are counted and skipped; only the transport
//! going away ends the loop.

use crate::metrics;
use anyhow::{Context, Result};
use roata_core::{ingest, IngestOutcome, StateStore};
use roata_transport::Transport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Counts of how received messages were handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub applied: u64,
    pub ignored: u64,
    pub dropped: u64,
    pub rejected: u64,
}

impl IngestStats {
    fn record(&mut self, outcome: &IngestOutcome) {
        self.received += 1;
        match outcome {
            IngestOutcome::Applied(_) => self.applied += 1,
            IngestOutcome::Ignored => self.ignored += 1,
            IngestOutcome::Dropped(_) => self.dropped += 1,
            IngestOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

/// Whether the ingestion worker is still draining the bus.
///
/// Cloned between the worker and the HTTP state. Starts out running and is
/// flipped once, when [`run`] returns.
#[derive(Debug, Clone)]
pub struct IngestStatus {
    running: Arc<AtomicBool>,
}

impl IngestStatus {
    /// A status for a worker that is about to start.
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for IngestStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscribe the transport to every configured topic pattern.
///
/// # Errors
///
/// Returns an error if any subscription fails.
pub async fn subscribe_all(transport: &mut dyn Transport, topics: &[String]) -> Result<()> {
    for topic in topics {
        transport
            .subscribe(topic)
            .await
            .with_context(|| format!("Failed to subscribe to {topic}"))?;
        info!(transport = transport.name(), pattern = %topic, "Subscribed");
    }
    Ok(())
}

/// Drain the transport into the store until it closes or fails.
///
/// `status` is marked stopped before returning.
pub async fn run(
    mut transport: Box<dyn Transport>,
    store: Arc<StateStore>,
    status: IngestStatus,
) -> IngestStats {
    let mut stats = IngestStats::default();
    info!(transport = transport.name(), "Starting ingestion");

    loop {
        match transport.recv().await {
            Ok(Some(message)) => {
                let start = Instant::now();
                let outcome = ingest::on_message(&store, &message.topic, &message.payload);

                metrics::record_latency(start.elapsed().as_secs_f64());
                metrics::record_message(message.payload.len(), outcome.label());
                if matches!(outcome, IngestOutcome::Applied(_)) {
                    metrics::record_store_stats(&store.stats());
                }
                stats.record(&outcome);
            }
            Ok(None) => {
                debug!(transport = transport.name(), "Transport closed");
                break;
            }
            Err(e) => {
                error!(transport = transport.name(), error = %e, "Transport failed");
                metrics::record_error("transport");
                break;
            }
        }
    }

    status.stop();
    info!(
        received = stats.received,
        applied = stats.applied,
        dropped = stats.dropped,
        "Ingestion stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use roata_protocol::{Event, RemovalEvent, TelemetryEvent};
    use roata_transport::memory;

    #[tokio::test]
    async fn test_worker_applies_in_order_and_survives_bad_messages() {
        let (publisher, mut transport) = memory::channel();
        let topics = vec!["telemetry/route/+".to_string(), "event/route/+".to_string()];
        subscribe_all(&mut transport, &topics).await.unwrap();

        publisher
            .publish_event(&Event::Telemetry(TelemetryEvent::new(
                "30", "T1", 47.0, 28.8, 90.0, 20.0,
            )))
            .unwrap();
        publisher.publish("telemetry/route/30", &b"garbage"[..]).unwrap();
        publisher
            .publish("telemetry/transport/T9", &b"{}"[..])
            .unwrap();
        publisher
            .publish_event(&Event::Removal(RemovalEvent::new("30", "T2")))
            .unwrap();
        publisher
            .publish_event(&Event::Telemetry(TelemetryEvent::new(
                "30", "T2", 47.1, 28.9, 180.0, 5.0,
            )))
            .unwrap();
        publisher
            .publish_event(&Event::Removal(RemovalEvent::new("30", "T1")))
            .unwrap();
        drop(publisher);

        let store = Arc::new(StateStore::new());
        let status = IngestStatus::new();
        let stats = run(Box::new(transport), Arc::clone(&store), status.clone()).await;
        assert!(!status.is_running());

        // The tracker telemetry topic was not subscribed.
        assert_eq!(
            stats,
            IngestStats {
                received: 5,
                applied: 4,
                ignored: 0,
                dropped: 1,
                rejected: 0,
            }
        );

        let route = store.get_route_trackers("30").unwrap();
        assert_eq!(route.len(), 1);
        assert!(route.contains_key("T2"));
        assert!(store.get_tracker("T1").is_some());
        assert!(store.get_tracker("T9").is_none());
    }

    #[tokio::test]
    async fn test_subscribe_all_rejects_invalid_pattern() {
        let (_publisher, mut transport) = memory::channel();
        let topics = vec!["telemetry/#/route".to_string()];
        assert!(subscribe_all(&mut transport, &topics).await.is_err());
    }
}
