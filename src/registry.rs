//! Disturbance registry
//!
//! Owns the disturbances of one context. Registration is explicit: the owner
//! registers a disturbance after building it and unregisters it on teardown.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::Disturbance;
use crate::DisturbanceError;

/// Handle returned by [`DisturbanceRegistry::register`]. Never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisturbanceId(pub u64);

impl fmt::Display for DisturbanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "disturbance#{}", self.0)
    }
}

/// Disturbances of one context, keyed by registration order.
#[derive(Default)]
pub struct DisturbanceRegistry {
    entries: BTreeMap<DisturbanceId, Box<dyn Disturbance>>,
    next_id: u64,
}

impl DisturbanceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `disturbance` and hand back its id.
    pub fn register(&mut self, disturbance: Box<dyn Disturbance>) -> DisturbanceId {
        let id = DisturbanceId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, disturbance);
        debug!(%id, registered = self.entries.len(), "disturbance registered");
        id
    }

    /// Remove a disturbance and return it to the caller.
    pub fn unregister(&mut self, id: DisturbanceId) -> Result<Box<dyn Disturbance>, DisturbanceError> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or(DisturbanceError::UnknownDisturbance(id))?;
        debug!(%id, registered = self.entries.len(), "disturbance unregistered");
        Ok(entry)
    }

    /// Look up a registered disturbance.
    pub fn get(&self, id: DisturbanceId) -> Option<&dyn Disturbance> {
        self.entries.get(&id).map(|d| d.as_ref())
    }

    /// Mutable lookup of a registered disturbance.
    pub fn get_mut(&mut self, id: DisturbanceId) -> Option<&mut (dyn Disturbance + 'static)> {
        self.entries.get_mut(&id).map(|d| d.as_mut())
    }

    /// Number of registered disturbances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = DisturbanceId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered disturbances currently active.
    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|d| d.is_active()).count()
    }

    /// Initialize every disturbance, see [`Disturbance::initialize`].
    pub fn initialize_all(&mut self, force: bool) {
        for d in self.entries.values_mut() {
            d.initialize(force);
        }
    }

    /// Activate every disturbance.
    pub fn activate_all(&mut self) {
        for d in self.entries.values_mut() {
            d.activate();
        }
    }

    /// Deactivate every disturbance.
    pub fn deactivate_all(&mut self) {
        for d in self.entries.values_mut() {
            d.deactivate();
        }
    }

    /// Set the same intensity on every disturbance.
    pub fn set_intensity_all(&mut self, intensity: f64) {
        for d in self.entries.values_mut() {
            d.set_intensity(intensity);
        }
    }

    /// Tick every registered disturbance in id order.
    pub fn tick_all(&mut self, dt: f64) {
        for d in self.entries.values_mut() {
            d.tick(dt);
        }
    }
}
