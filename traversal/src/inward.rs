use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use container::{Container, ContainerError, Pod, RemoveOptions as ContainerRemoveOptions};
use dispatcher::WorkDispatcher;
use fnv::FnvHashMap;
use graph::{Entry, Graph};
use parking_lot::Mutex;
use petgraph::graph::NodeIndex;
use tokio_util::sync::CancellationToken;

use crate::error::{NodeError, TraversalError};
use crate::options::{RemoveOptions, StopOptions};
use crate::state::SharedState;

enum ActionKind {
    Stop { timeout: Option<u64>, cleanup: bool },
    Remove { options: ContainerRemoveOptions },
}

struct ActionContext {
    pod: Option<Arc<dyn Pod>>,
    kind: ActionKind,
    /// Volume name -> ID of the container that referenced it. Populated
    /// only by the remove action.
    named_volumes: Mutex<FnvHashMap<String, String>>,
}

impl ActionContext {
    async fn run(&self, entry: &Entry) -> Result<(), ContainerError> {
        entry.container().lock().await;
        let result = match &self.kind {
            ActionKind::Stop { timeout, cleanup } => {
                stop_one(entry.container(), *timeout, *cleanup).await
            }
            ActionKind::Remove { options } => {
                remove_one(entry, *options, self.pod.as_ref(), &self.named_volumes).await
            }
        };
        entry.container().unlock().await;
        result
    }
}

async fn stop_one(
    container: &Arc<dyn Container>,
    timeout: Option<u64>,
    cleanup: bool,
) -> Result<(), ContainerError> {
    container.sync_state().await?;
    match container.stop(timeout).await {
        Ok(()) => {}
        Err(e) if e.is_already_stopped() || e.is_invalid_state() => {}
        Err(e) => return Err(e),
    }
    if cleanup {
        container.full_cleanup(true).await?;
    }
    Ok(())
}

async fn remove_one(
    entry: &Entry,
    options: ContainerRemoveOptions,
    pod: Option<&Arc<dyn Pod>>,
    named_volumes: &Mutex<FnvHashMap<String, String>>,
) -> Result<(), ContainerError> {
    let container = entry.container();
    container.sync_state().await?;

    {
        let mut volumes = named_volumes.lock();
        for name in container.named_volumes() {
            volumes.insert(name, entry.id().to_string());
        }
    }

    if let Some(pod) = pod {
        if pod.infra_container_id().as_deref() == Some(entry.id()) {
            pod.clear_infra_container_id();
            pod.save().await?;
        }
    }

    container.remove(options).await
}

/// Walks `dependsOn` edges, so that every node is acted on strictly after
/// all of its dependents. Shared for `stop_all` and `remove_all`, which
/// differ only in the `ActionContext` they run.
///
/// `N.lock` is held across the action's await deliberately: suspending a
/// traversal on a busy node is cheaper and simpler than polling, and is what
/// lets the readiness check in step 4 be re-evaluated safely by whichever
/// sibling acquires the lock next.
///
/// On a failed action, marking the node visited and releasing its lock is
/// delayed until *after* the error has been propagated to dependencies (the
/// recursive call below): this is the one place in the engine where the
/// unlock/mark ordering is outcome-dependent, and it exists so that a
/// sibling traversal reaching this node mid-propagation observes it as
/// failed rather than as cleanly visited.
fn visit_in(
    graph: Arc<Graph>,
    idx: NodeIndex<u32>,
    set_error: bool,
    shared: Arc<SharedState>,
    ctx: Arc<ActionContext>,
) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
    Box::pin(async move {
        let entry = graph.entry(idx);
        let mut guard = Some(entry.lock().await);

        if shared.is_visited(idx) {
            drop(guard.take());
            return;
        }

        if set_error {
            shared.mark_visited(idx);
            shared.record_error(idx, NodeError::DependencyFailed);
            drop(guard.take());
            log::warn!("{}: marked failed, a dependent failed", entry.id());

            for &dependency in entry.depends_on() {
                visit_in(
                    Arc::clone(&graph),
                    dependency,
                    true,
                    Arc::clone(&shared),
                    Arc::clone(&ctx),
                )
                .await;
            }
            return;
        }

        if entry
            .depended_on()
            .iter()
            .any(|&dependent| !shared.is_visited(dependent))
        {
            drop(guard.take());
            log::debug!("{}: not all dependents finished yet, deferring", entry.id());
            return;
        }

        match ctx.run(entry).await {
            Ok(()) => {
                shared.mark_visited(idx);
                drop(guard.take());
                log::debug!("{}: action succeeded", entry.id());

                for &dependency in entry.depends_on() {
                    visit_in(
                        Arc::clone(&graph),
                        dependency,
                        false,
                        Arc::clone(&shared),
                        Arc::clone(&ctx),
                    )
                    .await;
                }
            }
            Err(e) => {
                log::warn!("{}: action failed: {e}", entry.id());
                shared.record_error(idx, NodeError::Action(e));

                for &dependency in entry.depends_on() {
                    visit_in(
                        Arc::clone(&graph),
                        dependency,
                        true,
                        Arc::clone(&shared),
                        Arc::clone(&ctx),
                    )
                    .await;
                }

                shared.mark_visited(idx);
                drop(guard.take());
            }
        }
    })
}

async fn run_inward(
    graph: Arc<Graph>,
    dispatcher: &WorkDispatcher,
    cancellation: CancellationToken,
    ctx: Arc<ActionContext>,
) -> Result<Arc<SharedState>, TraversalError> {
    let entry_nodes: Vec<NodeIndex<u32>> = graph.not_depended_on_nodes().collect();
    if entry_nodes.is_empty() {
        return Err(TraversalError::NoEntryNodes);
    }

    let shared = Arc::new(SharedState::new());
    let mut completions = Vec::with_capacity(entry_nodes.len());

    for entry_idx in entry_nodes {
        let graph = Arc::clone(&graph);
        let shared = Arc::clone(&shared);
        let ctx = Arc::clone(&ctx);
        let cancellation = cancellation.clone();

        completions.push(dispatcher.enqueue(cancellation, async move {
            visit_in(graph, entry_idx, false, shared, ctx).await;
            Ok::<(), std::convert::Infallible>(())
        }));
    }

    for completion in completions {
        let _ = completion.await;
    }

    Ok(shared)
}

/// Runs `StopAll`: an inward traversal from `graph.not_depended_on_nodes()`.
pub async fn stop_all(
    graph: Arc<Graph>,
    dispatcher: &WorkDispatcher,
    cancellation: CancellationToken,
    pod: Option<Arc<dyn Pod>>,
    options: StopOptions,
) -> Result<FnvHashMap<String, NodeError>, TraversalError> {
    let ctx = Arc::new(ActionContext {
        pod,
        kind: ActionKind::Stop {
            timeout: options.timeout,
            cleanup: options.cleanup,
        },
        named_volumes: Mutex::new(FnvHashMap::default()),
    });

    let shared = run_inward(Arc::clone(&graph), dispatcher, cancellation, ctx).await?;
    Ok(shared.errors_by_id(|idx| graph.entry(idx).id().to_string()))
}

/// The outcome of `remove_all`: per-node errors, the set of visited
/// container IDs, and the named volumes referenced by removed containers,
/// each mapped to the ID of the container that referenced it.
pub struct RemoveOutcome {
    pub errors: FnvHashMap<String, NodeError>,
    pub visited: Vec<String>,
    pub named_volumes: FnvHashMap<String, String>,
}

/// Runs `RemoveAll`: an inward traversal from `graph.not_depended_on_nodes()`,
/// additionally collecting named-volume references.
pub async fn remove_all(
    graph: Arc<Graph>,
    dispatcher: &WorkDispatcher,
    cancellation: CancellationToken,
    pod: Option<Arc<dyn Pod>>,
    options: RemoveOptions,
) -> Result<RemoveOutcome, TraversalError> {
    let ctx = Arc::new(ActionContext {
        pod,
        kind: ActionKind::Remove {
            options: ContainerRemoveOptions {
                force: options.force,
                remove_pod: options.remove_pod,
                timeout: options.timeout,
            },
        },
        named_volumes: Mutex::new(FnvHashMap::default()),
    });

    let shared = run_inward(Arc::clone(&graph), dispatcher, cancellation, Arc::clone(&ctx)).await?;

    let errors = shared.errors_by_id(|idx| graph.entry(idx).id().to_string());
    let visited = shared
        .visited_indices()
        .into_iter()
        .map(|idx| graph.entry(idx).id().to_string())
        .collect();
    let named_volumes = Arc::try_unwrap(ctx)
        .unwrap_or_else(|_| panic!("ActionContext outlived run_inward's join on its jobs"))
        .named_volumes
        .into_inner();

    Ok(RemoveOutcome {
        errors,
        visited,
        named_volumes,
    })
}
