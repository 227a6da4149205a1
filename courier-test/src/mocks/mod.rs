mod destination;
mod fees;
mod submitter;

pub use destination::MockDestinationChain;
pub use fees::MockFeeOracle;
pub use submitter::MockSubmitter;
