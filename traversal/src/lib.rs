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

//! Executes `start`, `stop`, and `remove` operations over a `graph::Graph`
//! with parallel fan-out from entry nodes, per-node visitation guards, and
//! viral error propagation in the traversal direction.

mod error;
mod inward;
mod options;
mod start;
mod state;


pub use crate::error::{NodeError, TraversalError};
pub use crate::inward::{remove_all, stop_all, RemoveOutcome};
pub use crate::options::{RemoveOptions, StartOptions, StopOptions};
pub use crate::start::{start_all, StartOutcome};
