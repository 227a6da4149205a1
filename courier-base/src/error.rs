use courier_core::{ChainCommunicationError, CoordinatorError};

/// Errors raised while estimating and submitting a dispatch
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Bubbled up from a chain collaborator. Not retried
    #[error("{0}")]
    ChainCommunicationError(#[from] ChainCommunicationError),
    /// The simulation consumed its whole allowance, so the used figure is
    /// meaningless
    #[error("Simulation on {chain} exhausted its gas allowance of {allowance}")]
    AllowanceExhausted {
        /// Destination chain name
        chain: String,
        /// Allowance handed to the simulation
        allowance: u64,
    },
    /// Every attempt hit a transient failure
    #[error("Gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Failure of the final attempt
        last: Box<ChainCommunicationError>,
    },
}

/// Errors raised by the operator process
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// Bubbled up from the coordinator
    #[error("{0}")]
    CoordinatorError(#[from] CoordinatorError),
    /// The coordinator's event stream closed
    #[error("Coordinator event stream closed")]
    EventsClosed,
}
