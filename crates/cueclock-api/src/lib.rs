//! Protocol types for cueclockd IPC
//!
//! This crate defines the stable API between cueclockd and its callers:
//! - Commands (requests from clients)
//! - Responses and error codes
//! - Events (service -> clients)
//! - Table and session views shared with the store and core

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
