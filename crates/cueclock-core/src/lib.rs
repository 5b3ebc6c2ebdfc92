//! Table session state machine and billing engine for cueclockd
//!
//! This crate is the heart of cueclockd, containing:
//! - Billing clock (elapsed time on monotonic time, amount accrual)
//! - Table state machine (Idle -> Running <-> Paused -> Idle)
//! - Table registry (categories, dispatch, rates, session logs, split bills)

mod billing;
mod events;
mod registry;
mod table;

pub use billing::*;
pub use events::*;
pub use registry::*;
pub use table::*;
