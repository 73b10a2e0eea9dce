//! Shared fixtures for the Roata benchmarks.

use bytes::Bytes;
use roata_protocol::{codec, Event, RemovalEvent, TelemetryEvent};

/// Telemetry for tracker `i` of a fleet spread over `routes` routes.
#[must_use]
pub fn telemetry(i: usize, routes: usize) -> Event {
    let route = (i % routes.max(1)).to_string();
    let step = (i % 1000) as f64 / 10_000.0;
    Event::Telemetry(
        TelemetryEvent::new(route, format!("T{i}"), 47.0 + step, 28.8 + step, 90.0, 20.0)
            .with_board(format!("{}", 3000 + i)),
    )
}

/// Removal matching [`telemetry`] for the same tracker.
#[must_use]
pub fn removal(i: usize, routes: usize) -> Event {
    let route = (i % routes.max(1)).to_string();
    Event::Removal(RemovalEvent::new(route, format!("T{i}")))
}

/// Wire form of a fleet's telemetry, ready for the decoder.
#[must_use]
pub fn encoded_fleet(trackers: usize, routes: usize) -> Vec<(String, Bytes)> {
    (0..trackers)
        .filter_map(|i| codec::encode(&telemetry(i, routes)).ok())
        .collect()
}
