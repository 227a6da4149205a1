//! In-memory collaborators for single-process deployments and tests

mod chain;
mod effect;
mod owners;
mod token;

pub use chain::*;
pub use effect::*;
pub use owners::*;
pub use token::*;

/// A coordinator wired to in-memory collaborators
pub type MemoryCoordinator = crate::Coordinator<MemoryToken, ManualClock, RecordingEffect>;
