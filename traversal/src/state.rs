use fnv::{FnvHashMap, FnvHashSet};
use parking_lot::Mutex;
use petgraph::graph::NodeIndex;

use crate::error::NodeError;

/// The visited and error maps shared by every job of a single traversal
/// operation. Created fresh per call to `start_all`/`stop_all`/`remove_all`
/// and discarded once it returns.
///
/// Both maps need only per-key atomicity, not ordering between unrelated
/// keys, so a plain map behind one mutex is sufficient (per the engine's own
/// design notes) rather than a lock-free concurrent map.
pub(crate) struct SharedState {
    visited: Mutex<FnvHashSet<NodeIndex<u32>>>,
    errors: Mutex<FnvHashMap<NodeIndex<u32>, NodeError>>,
}

impl SharedState {
    pub(crate) fn new() -> SharedState {
        SharedState {
            visited: Mutex::new(FnvHashSet::default()),
            errors: Mutex::new(FnvHashMap::default()),
        }
    }

    pub(crate) fn is_visited(&self, idx: NodeIndex<u32>) -> bool {
        self.visited.lock().contains(&idx)
    }

    pub(crate) fn mark_visited(&self, idx: NodeIndex<u32>) {
        self.visited.lock().insert(idx);
    }

    pub(crate) fn record_error(&self, idx: NodeIndex<u32>, error: NodeError) {
        self.errors.lock().insert(idx, error);
    }

    pub(crate) fn visited_indices(&self) -> FnvHashSet<NodeIndex<u32>> {
        self.visited.lock().clone()
    }

    pub(crate) fn errors_by_id(
        &self,
        id_of: impl Fn(NodeIndex<u32>) -> String,
    ) -> FnvHashMap<String, NodeError> {
        self.errors
            .lock()
            .iter()
            .map(|(&idx, err)| (id_of(idx), err.clone()))
            .collect()
    }
}
