#![deny(warnings)]
#![deny(
    clippy::all,
    clippy::default_trait_access,
    clippy::expl_impl_clone_on_copy,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::unseparated_literal_suffix,
    clippy::used_underscore_binding
)]
#![allow(clippy::match_ref_pats)]
#![allow(
    clippy::len_without_is_empty,
    clippy::redundant_field_names,
    clippy::too_many_arguments
)]
#![allow(clippy::new_without_default, clippy::new_ret_no_self)]
#![allow(clippy::mutex_atomic)]

//! Builds a validated container dependency DAG from a flat set of container
//! handles, and rejects cyclic input via Tarjan's strongly-connected-
//! components algorithm.

mod entry;
mod error;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use container::Container;
use fnv::FnvHashMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

pub use crate::entry::Entry;
pub use crate::error::BuildError;

type PGraph = DiGraph<Entry, (), u32>;

/// A validated, immutable container dependency graph.
///
/// Nodes are allocated once, during `build`, and never change shape
/// afterward: edges are never added or removed. A `Graph` is meant to be
/// built, traversed once (possibly by several concurrent operations sharing
/// it, such as a stop followed by a remove), and discarded.
pub struct Graph {
    pg: PGraph,
    nodes: FnvHashMap<String, NodeIndex<u32>>,
    no_dep_nodes: Vec<NodeIndex<u32>>,
    not_depended_on_nodes: FnvHashMap<String, NodeIndex<u32>>,
}

impl Graph {
    /// Validates and builds a `Graph` from a flat set of containers, each
    /// declaring its dependencies by ID.
    ///
    /// Fails with `UnknownDependency` if any declared dependency ID is not
    /// among `containers`, or `CyclicGraph` if the induced `dependsOn` graph
    /// contains a cycle (including a single self-loop). Never returns a
    /// partial graph on error.
    pub fn build(containers: Vec<Arc<dyn Container>>) -> Result<Graph, BuildError> {
        let mut pg = PGraph::with_capacity(containers.len(), containers.len());
        let mut nodes = FnvHashMap::default();
        let mut not_depended_on_nodes = FnvHashMap::default();

        for container in &containers {
            let id = container.id().to_string();
            let idx = pg.add_node(Entry::new(Arc::clone(container)));
            nodes.insert(id.clone(), idx);
            not_depended_on_nodes.insert(id, idx);
        }

        let mut no_dep_nodes = Vec::new();
        for container in &containers {
            let node_idx = nodes[container.id()];
            for dependency_id in container.dependencies() {
                let dep_idx = *nodes
                    .get(dependency_id)
                    .ok_or_else(|| BuildError::UnknownDependency {
                        node: container.id().to_string(),
                        dependency: dependency_id.clone(),
                    })?;

                log::trace!(
                    "materializing edge {} -> {dependency_id}",
                    container.id()
                );
                pg.add_edge(node_idx, dep_idx, ());
                pg[node_idx].push_depends_on(dep_idx);
                pg[dep_idx].push_depended_on(node_idx);
                not_depended_on_nodes.remove(dependency_id);
            }

            if pg[node_idx].depends_on().is_empty() {
                no_dep_nodes.push(node_idx);
            }
        }

        check_acyclic(&pg)?;

        Ok(Graph {
            pg,
            nodes,
            no_dep_nodes,
            not_depended_on_nodes,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn entry(&self, idx: NodeIndex<u32>) -> &Entry {
        &self.pg[idx]
    }

    pub fn index_for(&self, id: &str) -> Option<NodeIndex<u32>> {
        self.nodes.get(id).copied()
    }

    pub fn entry_by_id(&self, id: &str) -> Option<&Entry> {
        self.index_for(id).map(|idx| self.entry(idx))
    }

    /// Entry points for outward (start) traversal: nodes with no
    /// dependencies.
    pub fn no_dep_nodes(&self) -> &[NodeIndex<u32>] {
        &self.no_dep_nodes
    }

    /// Entry points for inward (stop/remove) traversal: nodes with no
    /// dependents.
    pub fn not_depended_on_nodes(&self) -> impl Iterator<Item = NodeIndex<u32>> + '_ {
        self.not_depended_on_nodes.values().copied()
    }

    pub fn node_count(&self) -> usize {
        self.pg.node_count()
    }
}

/// Runs Tarjan's strongly-connected-components algorithm over the
/// `dependsOn` edges and fails on the first SCC of size greater than one, or
/// any self-loop. The enumeration order of `tarjan_scc` is whatever
/// `petgraph` produces for a fixed graph; the contract only promises a
/// deterministic boolean result, not which SCC is reported.
fn check_acyclic(pg: &PGraph) -> Result<(), BuildError> {
    for scc in tarjan_scc(pg) {
        match scc.as_slice() {
            [] => unreachable!("tarjan_scc never yields an empty component"),
            [single] => {
                if pg.find_edge(*single, *single).is_some() {
                    log::warn!("self-loop detected during cycle check");
                    return Err(BuildError::CyclicGraph);
                }
            }
            _ => {
                log::warn!("strongly-connected component of size > 1 detected");
                return Err(BuildError::CyclicGraph);
            }
        }
    }
    Ok(())
}
