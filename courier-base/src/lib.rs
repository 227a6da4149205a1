//! Client-side and agent plumbing for Courier.
//!
//! This crate contains:
//! - the dispatch pipeline: gas estimation, fee quoting and bounded
//!   submission retries
//! - the operator process that discovers and executes jobs
//! - settings, tracing and prometheus metrics shared by Courier processes

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

mod agent;
pub use agent::*;

/// Dispatch pipeline
pub mod dispatch;
pub use dispatch::*;

mod error;
pub use error::*;

mod metrics;
pub use metrics::*;

/// Operator process
pub mod operator;
pub use operator::{Flow, Operator};

mod settings;
pub use settings::*;
