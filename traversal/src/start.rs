use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fnv::FnvHashMap;
use graph::Graph;
use petgraph::graph::NodeIndex;

use crate::error::{NodeError, TraversalError};
use crate::options::StartOptions;
use crate::state::SharedState;

/// The outcome of `start_all`: per-node errors (empty on full success), plus
/// `aggregate_error`, a single sentinel for callers that want a yes/no
/// signal instead of checking map emptiness themselves.
pub struct StartOutcome {
    pub errors: FnvHashMap<String, NodeError>,
}

impl StartOutcome {
    /// `Some` iff at least one container failed to start, directly or by
    /// viral propagation from a failed dependency.
    pub fn aggregate_error(&self) -> Option<TraversalError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(TraversalError::SomeContainersFailedToStart)
        }
    }
}

/// Runs `StartAll`: an outward traversal from `graph.no_dep_nodes()`, walking
/// `dependedOn` edges from leaves to roots.
///
/// Driven sequentially from each entry node rather than through the work
/// dispatcher (see the engine's design notes on why start's per-node
/// locking discipline differs from stop/remove): the implementation is free
/// to parallelize this, but the `visited` map must stay the single
/// linearizable source of truth if it ever does.
pub async fn start_all(graph: Arc<Graph>, options: StartOptions) -> StartOutcome {
    let shared = SharedState::new();

    for &entry_idx in graph.no_dep_nodes() {
        visit_out(Arc::clone(&graph), entry_idx, false, &shared, options).await;
    }

    StartOutcome {
        errors: shared.errors_by_id(|idx| graph.entry(idx).id().to_string()),
    }
}

fn visit_out<'s>(
    graph: Arc<Graph>,
    idx: NodeIndex<u32>,
    set_error: bool,
    shared: &'s SharedState,
    options: StartOptions,
) -> Pin<Box<dyn Future<Output = ()> + Send + 's>> {
    Box::pin(async move {
        if shared.is_visited(idx) {
            return;
        }

        if set_error {
            shared.mark_visited(idx);
            shared.record_error(idx, NodeError::DependencyFailed);
            log::warn!(
                "{}: marked failed, a dependency failed to start",
                graph.entry(idx).id()
            );
            for &dependent in graph.entry(idx).depended_on() {
                visit_out(Arc::clone(&graph), dependent, true, shared, options).await;
            }
            return;
        }

        let entry = graph.entry(idx);
        if entry
            .depends_on()
            .iter()
            .any(|&dep| !shared.is_visited(dep))
        {
            log::debug!(
                "{}: not all dependencies started yet, deferring",
                entry.id()
            );
            return;
        }

        // Committed before the action runs: start's single-visit guarantee
        // (each node reaches this point from exactly one winning caller)
        // means no one can re-enter N once this is set.
        shared.mark_visited(idx);

        let dependency_ids: Vec<String> = entry
            .depends_on()
            .iter()
            .map(|&dep| graph.entry(dep).id().to_string())
            .collect();

        let mut errored = false;
        match entry
            .container()
            .check_dependencies_running(&dependency_ids)
            .await
        {
            Ok(not_running) if !not_running.is_empty() => {
                log::warn!(
                    "{}: dependencies not running: {}",
                    entry.id(),
                    not_running.join(", ")
                );
                shared.record_error(idx, NodeError::DependencyNotRunning(not_running));
                errored = true;
            }
            Ok(_) => {}
            Err(e) => {
                shared.record_error(idx, NodeError::Action(e));
                errored = true;
            }
        }

        if !errored {
            entry.container().lock().await;
            let result = match entry.container().sync_state().await {
                Ok(()) if options.restart => {
                    entry.container().restart_with_timeout(options.timeout).await
                }
                Ok(()) => entry.container().init_and_start().await,
                Err(e) => Err(e),
            };
            entry.container().unlock().await;

            if let Err(e) = result {
                log::warn!("{}: start failed: {e}", entry.id());
                shared.record_error(idx, NodeError::Action(e));
                errored = true;
            } else {
                log::debug!("{}: started", entry.id());
            }
        }

        for &dependent in entry.depended_on() {
            visit_out(Arc::clone(&graph), dependent, errored, shared, options).await;
        }
    })
}
