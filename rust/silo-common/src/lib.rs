//! Core definitions (error type, result alias, liveness callback trait),
//! relied upon by all silo-* crates.

pub mod error;
pub mod progress;
pub mod result;

pub use progress::Progress;
pub use result::Result;
