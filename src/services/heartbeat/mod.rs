//! Heartbeat module
//!
//! This module keeps registered instances alive against a remote registry:
//! - `types`: instance records, beat records and scheduler stats
//! - `error`: heartbeat outcome errors
//! - `beater`: the remote heartbeat capability
//! - `scheduler`: instance registration, inspection and shutdown
//! - `beat_loop`: the per-instance background task

pub mod beat_loop;
pub mod beater;
pub mod error;
pub mod scheduler;
pub mod types;

pub use beater::Beater;
pub use error::BeatError;
pub use scheduler::HeartbeatScheduler;
pub use types::{BeatRecord, InstanceInfo, InstanceRecord, InstanceStatus, SchedulerStats};
