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

//! The capability seam the dependency graph engine programs against. This
//! crate defines no behavior of its own: it is the narrow set of traits and
//! value types that `graph` and `traversal` invoke to observe and act on a
//! container/pod, independent of whatever OCI runtime, storage, and network
//! plumbing actually backs them.

use std::fmt;

use async_trait::async_trait;

/// Options accepted by `Container::remove`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Remove even if the container is still running.
    pub force: bool,
    /// Also remove the owning pod once its last container is gone.
    pub remove_pod: bool,
    /// Seconds to wait for a graceful stop before the remove escalates; `None`
    /// defers to the container's own configured default.
    pub timeout: Option<u64>,
}

/// A coarse, read-only view of a container's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Configured,
    Created,
    Running,
    Paused,
    Stopped,
    Exited,
    Removing,
    Removed,
}

/// The error taxonomy the engine recognizes from its collaborators, by
/// equivalence rather than type matching (see `is_already_stopped` /
/// `is_invalid_state`).
#[derive(Debug, Clone)]
pub enum ContainerError {
    NoSuchContainer(String),
    ContainerRemoved(String),
    AlreadyStopped(String),
    InvalidState(String),
    Internal(String),
}

impl ContainerError {
    /// True for errors the stop action treats as "already in the desired
    /// end state", i.e. success.
    pub fn is_already_stopped(&self) -> bool {
        matches!(self, ContainerError::AlreadyStopped(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, ContainerError::InvalidState(_))
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::NoSuchContainer(id) => write!(f, "no such container: {id}"),
            ContainerError::ContainerRemoved(id) => write!(f, "container already removed: {id}"),
            ContainerError::AlreadyStopped(id) => write!(f, "container already stopped: {id}"),
            ContainerError::InvalidState(id) => {
                write!(f, "container in an invalid state for this operation: {id}")
            }
            ContainerError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ContainerError {}

/// The capability set the engine requires of every container handle. The
/// engine never constructs one of these directly; it is handed a pool of
/// them (typically `Arc<dyn Container>`) built and owned elsewhere.
#[async_trait]
pub trait Container: Send + Sync {
    /// Stable identifier. Used as the key into `graph::Graph::nodes`.
    fn id(&self) -> &str;

    /// Declared dependency IDs, in declaration order. The graph builder
    /// walks this exactly once, in this order, to materialize edges.
    fn dependencies(&self) -> &[String];

    /// Acquire this container's own lock. Distinct from, and never held
    /// across, the traversal engine's per-node `lock` (see `graph::Entry`).
    async fn lock(&self);

    /// Release the lock acquired by `lock`.
    async fn unlock(&self);

    /// Refresh mutable state (e.g. from the persistent store) before acting.
    async fn sync_state(&self) -> Result<(), ContainerError>;

    /// Given a set of dependency IDs, return the subset whose current state
    /// is not running-equivalent. Infra containers are always treated as
    /// running.
    async fn check_dependencies_running(
        &self,
        dependency_ids: &[String],
    ) -> Result<Vec<String>, ContainerError>;

    /// Start a freshly-created container.
    async fn init_and_start(&self) -> Result<(), ContainerError>;

    /// Restart an existing container, honoring the given stop timeout before
    /// the restart.
    async fn restart_with_timeout(&self, timeout: Option<u64>) -> Result<(), ContainerError>;

    /// Stop the container. May return `AlreadyStopped` or `InvalidState`,
    /// both of which the stop action treats as success.
    async fn stop(&self, timeout: Option<u64>) -> Result<(), ContainerError>;

    /// Tear down ancillary resources (network namespace, tmpfs mounts, ...).
    /// `only_stopped` restricts cleanup to containers already confirmed
    /// stopped.
    async fn full_cleanup(&self, only_stopped: bool) -> Result<(), ContainerError>;

    /// Remove the container and its on-disk state.
    async fn remove(&self, opts: RemoveOptions) -> Result<(), ContainerError>;

    fn state(&self) -> ContainerState;

    /// Infra (pause) containers are always considered running for
    /// dependency-liveness purposes.
    fn is_infra(&self) -> bool;

    /// Named volume references owned by this container, collected by the
    /// remove action into the shared volume map.
    fn named_volumes(&self) -> Vec<String>;
}

/// The pod capability set, supplied optionally to `StopAll`/`RemoveAll`. Per
/// the engine's contract, the pod's own lock must already be held by the
/// caller before the traversal begins; the engine never locks or unlocks a
/// pod itself.
#[async_trait]
pub trait Pod: Send + Sync {
    fn id(&self) -> &str;

    /// The container ID of this pod's infra container, if it still has one.
    fn infra_container_id(&self) -> Option<String>;

    /// Clear the infra container reference, e.g. once that container has
    /// been removed.
    fn clear_infra_container_id(&self);

    /// Persist the pod's current state.
    async fn save(&self) -> Result<(), ContainerError>;
}
