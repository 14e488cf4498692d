//! lc-core: stable foundation for loopctl.
//!
//! Contains:
//! - numeric (finiteness checks and float helpers for limit pairs)
//! - error (shared error types)

pub mod error;
pub mod numeric;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
