//! Mocks of the async chain collaborators used by dispatch and operator
//! tests

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

/// mockall implementations of the destination, fee and submission traits
pub mod mocks;
