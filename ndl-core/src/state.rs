//! Frozen database state: one [`ObjectState`] per object.

use crate::fqon::Fqon;
use crate::object_state::ObjectState;
use hashbrown::HashMap;
use std::sync::Arc;

/// Immutable snapshot of every object's state at one point in time.
///
/// Produced once by the loader; views layer their own per-time deltas on
/// top and fall back here. States are `Arc`-shared so later snapshots
/// reuse untouched objects structurally.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    objects: HashMap<Fqon, Arc<ObjectState>>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze a loader-built state map into a snapshot.
    pub fn from_states(states: HashMap<Fqon, ObjectState>) -> Self {
        Self {
            objects: states
                .into_iter()
                .map(|(fqon, state)| (fqon, Arc::new(state)))
                .collect(),
        }
    }

    /// Look up an object's state.
    pub fn get(&self, fqon: &str) -> Option<&Arc<ObjectState>> {
        self.objects.get(fqon)
    }

    /// All object states.
    pub fn iter(&self) -> impl Iterator<Item = (&Fqon, &Arc<ObjectState>)> {
        self.objects.iter()
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
