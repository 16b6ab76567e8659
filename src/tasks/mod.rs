//! Background Tasks Module
//!
//! # Tasks
//! - TTL cleanup: sweeps idle entries out of every group's store
//! - Flight sweeper: drops expired coalesced results

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_flight_sweeper};
