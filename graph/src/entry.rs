use std::sync::Arc;

use container::Container;
use petgraph::graph::NodeIndex;
use tokio::sync::{Mutex, MutexGuard};

/// A single per-container vertex.
///
/// `depends_on`/`depended_on` are maintained as explicit, insertion-ordered
/// vectors rather than derived from `petgraph` neighbor iteration: the
/// traversal engine's fan-out must walk dependencies in declaration order,
/// and petgraph makes no ordering guarantee for `neighbors`/`neighbors_directed`.
///
/// `lock` is acquired only by the traversal engine (inward traversal), never
/// by `Graph` itself and never across an await into the container's own
/// lock.
pub struct Entry {
    id: String,
    container: Arc<dyn Container>,
    depends_on: Vec<NodeIndex<u32>>,
    depended_on: Vec<NodeIndex<u32>>,
    lock: Mutex<()>,
}

impl Entry {
    pub(crate) fn new(container: Arc<dyn Container>) -> Entry {
        Entry {
            id: container.id().to_string(),
            container,
            depends_on: Vec::new(),
            depended_on: Vec::new(),
            lock: Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    /// Dependency nodes, in declaration order.
    pub fn depends_on(&self) -> &[NodeIndex<u32>] {
        &self.depends_on
    }

    /// Dependent nodes (the inverse edges), in the order their dependency
    /// declarations were materialized.
    pub fn depended_on(&self) -> &[NodeIndex<u32>] {
        &self.depended_on
    }

    pub(crate) fn push_depends_on(&mut self, idx: NodeIndex<u32>) {
        self.depends_on.push(idx);
    }

    pub(crate) fn push_depended_on(&mut self, idx: NodeIndex<u32>) {
        self.depended_on.push(idx);
    }

    /// Acquire this node's visitation lock.
    ///
    /// Inward traversal holds this guard across the action callback's
    /// await, since suspending here (rather than blocking a worker thread)
    /// is what lets sibling traversals legitimately wait on a node that is
    /// mid-action. It is never held across a recursive call into a peer's
    /// own lock; recursion happens only after this lock is released,
    /// except on the delayed-unlock error path described in
    /// `traversal::visit_in`.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}
