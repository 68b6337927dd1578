// src/dag/mod.rs

//! Dependency graph and the structural passes over it.
//!
//! - [`graph`] builds the producer -> consumer graph over operations.
//! - [`critical_path`] ranks operations by their longest chain to a sink.
//! - [`bounds`] computes each operation's ASAP/ALAP cycle window.
//! - [`scheduler`] is the resource-constrained list scheduler.

pub mod bounds;
pub mod critical_path;
pub mod graph;
pub mod scheduler;

pub use bounds::{Bounds, alap, asap};
pub use critical_path::critical_path_lengths;
pub use graph::{OpId, OperationGraph};
pub use scheduler::{ListScheduler, list_schedule};
