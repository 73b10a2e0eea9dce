//! The live vehicle/route state store.
//!
//! Both tables sit behind one reader-writer lock. Every event is applied
//! under a single write guard, so a reader sees either none or all of it.

use crate::route::RouteIndex;
use crate::tracker::{Tracker, TrackerId};
use chrono::{DateTime, Utc};
use roata_protocol::{Event, RemovalEvent, TelemetryEvent, ValidationError, SERVICE_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event failed validation and was not applied.
    #[error("Rejected event: {0}")]
    InvalidEvent(#[from] ValidationError),
}

/// What applying an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A tracker was seen for the first time.
    TrackerCreated,
    /// An existing tracker was updated.
    TrackerUpdated,
    /// A tracker was removed from a route.
    Removed,
    /// A removal named a tracker that was not a member. Nothing changed.
    RemovalNoop,
    /// The event carries nothing to apply.
    Ignored,
}

/// Health counters reported on the index endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Payload protocol version.
    pub protocol: String,
    /// When the store was created.
    #[serde(with = "roata_protocol::time_format")]
    pub started_at: DateTime<Utc>,
    /// Number of known trackers.
    pub trackers: usize,
    /// Number of known routes.
    pub routes: usize,
}

/// Store statistics.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Number of known trackers.
    pub tracker_count: usize,
    /// Number of known routes.
    pub route_count: usize,
    /// Total route memberships.
    pub membership_count: usize,
    /// Dangling memberships removed at query time since start.
    pub dangling_repaired: u64,
}

#[derive(Debug, Default)]
struct Tables {
    trackers: HashMap<TrackerId, Tracker>,
    routes: RouteIndex,
}

/// Shared state for trackers and route membership.
///
/// Writes go through [`StateStore::apply`]; everything else is read-only.
#[derive(Debug)]
pub struct StateStore {
    tables: RwLock<Tables>,
    started_at: DateTime<Utc>,
    dangling_repaired: AtomicU64,
}

impl StateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        info!("Creating state store");
        Self {
            tables: RwLock::new(Tables::default()),
            started_at: Utc::now(),
            dangling_repaired: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one decoded event.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving state untouched, if the event fails
    /// validation.
    pub fn apply(&self, event: &Event) -> Result<ApplyOutcome, StoreError> {
        match event {
            Event::Telemetry(telemetry) => self.apply_telemetry(telemetry),
            Event::Removal(removal) => self.apply_removal(removal),
            Event::Unrecognized => Ok(ApplyOutcome::Ignored),
        }
    }

    fn apply_telemetry(&self, event: &TelemetryEvent) -> Result<ApplyOutcome, StoreError> {
        event.validate()?;

        let mut tables = self.write();

        let outcome = if let Some(tracker) = tables.trackers.get_mut(&event.tracker_id) {
            tracker.apply(event);
            ApplyOutcome::TrackerUpdated
        } else {
            debug!(tracker = %event.tracker_id, "Creating new tracker");
            tables
                .trackers
                .insert(event.tracker_id.clone(), Tracker::from_telemetry(event));
            ApplyOutcome::TrackerCreated
        };

        if let Some(route_id) = &event.route_id {
            tables.routes.add(route_id, &event.tracker_id);
        }

        Ok(outcome)
    }

    fn apply_removal(&self, event: &RemovalEvent) -> Result<ApplyOutcome, StoreError> {
        event.validate()?;

        if self.write().routes.remove(&event.route_id, &event.tracker_id) {
            Ok(ApplyOutcome::Removed)
        } else {
            trace!(
                route = %event.route_id,
                tracker = %event.tracker_id,
                "Removal for non-member"
            );
            Ok(ApplyOutcome::RemovalNoop)
        }
    }

    /// Get a tracker by id.
    #[must_use]
    pub fn get_tracker(&self, tracker_id: &str) -> Option<Tracker> {
        self.read().trackers.get(tracker_id).cloned()
    }

    /// Snapshot of every known tracker.
    #[must_use]
    pub fn list_trackers(&self) -> HashMap<TrackerId, Tracker> {
        self.read().trackers.clone()
    }

    /// Trackers currently assigned to a route.
    ///
    /// Returns `None` if the route was never observed. Members without a
    /// tracker record are dropped from the result and removed from the route.
    #[must_use]
    pub fn get_route_trackers(&self, route_id: &str) -> Option<HashMap<TrackerId, Tracker>> {
        let (resolved, dangling) = {
            let tables = self.read();
            let members = tables.routes.members(route_id)?;

            let mut resolved = HashMap::with_capacity(members.len());
            let mut dangling = Vec::new();
            for tracker_id in members {
                match tables.trackers.get(tracker_id) {
                    Some(tracker) => {
                        resolved.insert(tracker_id.clone(), tracker.clone());
                    }
                    None => dangling.push(tracker_id.clone()),
                }
            }
            (resolved, dangling)
        };

        if !dangling.is_empty() {
            self.repair(route_id, &dangling);
        }

        Some(resolved)
    }

    /// Remove memberships that still have no tracker record.
    fn repair(&self, route_id: &str, dangling: &[TrackerId]) {
        let mut tables = self.write();
        for tracker_id in dangling {
            // The tracker may have arrived between the two guards.
            if tables.trackers.contains_key(tracker_id) {
                continue;
            }
            if tables.routes.remove(route_id, tracker_id) {
                self.dangling_repaired.fetch_add(1, Ordering::Relaxed);
                warn!(
                    route = %route_id,
                    tracker = %tracker_id,
                    "Removed dangling route membership"
                );
            }
        }
    }

    /// Health counters for the index endpoint.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let tables = self.read();
        Summary {
            status: "ok".to_string(),
            version: SERVICE_VERSION.to_string(),
            protocol: roata_protocol::PROTOCOL_VERSION.to_string(),
            started_at: self.started_at,
            trackers: tables.trackers.len(),
            routes: tables.routes.route_count(),
        }
    }

    /// Get store statistics.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let tables = self.read();
        StoreStats {
            tracker_count: tables.trackers.len(),
            route_count: tables.routes.route_count(),
            membership_count: tables.routes.membership_count(),
            dangling_repaired: self.dangling_repaired.load(Ordering::Relaxed),
        }
    }

    /// When the store was created.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
