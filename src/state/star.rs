// Star toggle state.
// Guards against a second star mutation for a node while one is in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, StargazeError};
use crate::github::StarState;

/// Which mutation a toggle sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarAction {
    Add,
    Remove,
}

impl StarAction {
    /// Mutation that flips `state`.
    pub fn for_state(state: &StarState) -> Self {
        if state.viewer_has_starred {
            StarAction::Remove
        } else {
            StarAction::Add
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StarAction::Add => "star",
            StarAction::Remove => "unstar",
        }
    }
}

/// Nodes with a star mutation in flight.
///
/// A node is disabled from `begin` until the returned [`StarGuard`] is
/// dropped. Dropping it covers success, failure and an abandoned settle
/// future alike. In-flight mutations cannot be cancelled on the server.
#[derive(Debug, Default)]
pub struct StarToggles {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Keeps one node disabled while alive.
#[derive(Debug)]
pub struct StarGuard {
    node_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl StarGuard {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

impl Drop for StarGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.node_id);
    }
}

fn lock(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StarToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `node_id` in flight, rejecting the trigger if it already is.
    pub fn begin(&self, node_id: &str) -> Result<StarGuard> {
        if !lock(&self.in_flight).insert(node_id.to_string()) {
            return Err(StargazeError::StarInFlight(node_id.to_string()));
        }
        Ok(StarGuard {
            node_id: node_id.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, node_id: &str) -> bool {
        lock(&self.in_flight).contains(node_id)
    }
}
