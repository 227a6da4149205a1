mod bond;
mod job;
mod payload;

pub use bond::*;
pub use job::*;
pub use payload::*;
