//! cueclockd service internals
//!
//! Wires together:
//! - Configuration
//! - Store
//! - Table registry
//! - IPC server
//! - Periodic billing tick

mod service;
mod ticker;

pub use service::*;
pub use ticker::*;
