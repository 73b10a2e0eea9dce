//! # roata-core
//!
//! Live vehicle/route state for Roata.
//!
//! This crate provides:
//!
//! - **Tracker** - latest known telemetry of one vehicle
//! - **RouteIndex** - route to assigned trackers
//! - **StateStore** - both tables behind one lock, with the reducer and the
//!   read-only queries
//! - **ingest** - decode a bus message and apply it, absorbing failures
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────────────┐
//! │  Transport  │────▶│   Decoder   │────▶│ StateStore               │
//! └─────────────┘     └─────────────┘     │  trackers + route index  │
//!                                         └──────────────────────────┘
//!                                                      ▲
//!                                                      │ queries
//!                                               ┌─────────────┐
//!                                               │    HTTP     │
//!                                               └─────────────┘
//! ```

pub mod ingest;
pub mod route;
pub mod store;
pub mod tracker;

pub use ingest::{on_message, IngestOutcome};
pub use route::{RouteId, RouteIndex};
pub use store::{ApplyOutcome, StateStore, StoreError, StoreStats, Summary};
pub use tracker::{Tracker, TrackerId};
