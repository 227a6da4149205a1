//! Courier. Cross-chain operator job coordination
//!
//! This crate contains the core primitives, stores and state machine of the
//! destination-side protocol: job identification, pod membership and bonds,
//! operator selection, execution windows, slashing and settlement.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![forbid(unsafe_code)]

/// Coordinator facade and events
pub mod coordinator;
pub use coordinator::*;

mod error;
pub use error::*;

/// Job lifecycle components
pub mod jobs;
pub use jobs::{price_ceiling, ExecutionWindow, Executor, JobStore, Scheduler, WindowPhase};

/// Pods and bonds
pub mod ledger;
pub use ledger::*;

/// In-memory collaborator implementations
pub mod models;

/// Collaborator and operator-facing traits
mod traits;
pub use traits::*;

/// Core data structures
mod types;
pub use types::*;

/// Hashing helpers
pub mod utils;

pub use courier_types::JobId;
