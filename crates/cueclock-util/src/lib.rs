//! Shared utilities for cueclockd
//!
//! This crate provides:
//! - ID types (CategoryId, TableId, ClientId)
//! - Time utilities (monotonic time, clock and elapsed formatting)
//! - Money rounding helpers
//! - Error types
//! - Default paths for socket, data and config files

mod error;
mod ids;
mod money;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use money::*;
pub use paths::*;
pub use time::*;
