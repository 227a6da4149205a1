//! Agent configuration (logging, intervals, addresses, etc).
//!
//! All structs defined in this module include public data only. Signing keys
//! are never part of these blocks.

mod logging;
pub use logging::*;

mod operator;
pub use operator::*;
