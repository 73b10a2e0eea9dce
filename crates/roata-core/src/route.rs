//! Route membership index.
//!
//! Maps each route to the set of trackers currently assigned to it. A route
//! entry is created on its first membership addition and is kept even after
//! its last member is removed.

use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A route identifier.
pub type RouteId = String;

/// Route id to member tracker ids.
#[derive(Debug, Default)]
pub struct RouteIndex {
    routes: HashMap<RouteId, HashSet<String>>,
}

impl RouteIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tracker to a route, creating the route if absent.
    ///
    /// Returns `true` if the tracker was not already a member.
    pub fn add(&mut self, route_id: &str, tracker_id: &str) -> bool {
        if !self.routes.contains_key(route_id) {
            debug!(route = %route_id, "Creating new route");
        }
        let members = self.routes.entry(route_id.to_string()).or_default();

        if members.contains(tracker_id) {
            return false;
        }
        members.insert(tracker_id.to_string());
        debug!(
            route = %route_id,
            tracker = %tracker_id,
            members = members.len(),
            "Tracker joined route"
        );
        true
    }

    /// Remove a tracker from a route.
    ///
    /// Returns `true` if the tracker was a member. Removing a non-member, or
    /// removing from an unknown route, changes nothing.
    pub fn remove(&mut self, route_id: &str, tracker_id: &str) -> bool {
        let removed = self
            .routes
            .get_mut(route_id)
            .is_some_and(|members| members.remove(tracker_id));
        if removed {
            debug!(route = %route_id, tracker = %tracker_id, "Tracker left route");
        }
        removed
    }

    /// Members of a route, or `None` if the route was never observed.
    #[must_use]
    pub fn members(&self, route_id: &str) -> Option<&HashSet<String>> {
        self.routes.get(route_id)
    }

    /// Check whether a tracker is assigned to a route.
    #[must_use]
    pub fn contains(&self, route_id: &str, tracker_id: &str) -> bool {
        self.routes
            .get(route_id)
            .is_some_and(|members| members.contains(tracker_id))
    }

    /// Number of known routes, empty ones included.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Total memberships across all routes.
    #[must_use]
    pub fn membership_count(&self) -> usize {
        self.routes.values().map(HashSet::len).sum()
    }
}
