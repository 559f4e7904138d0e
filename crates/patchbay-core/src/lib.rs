//! Patchbay Core - bridge between a realtime hardware audio graph and a
//! per-sample host modular graph

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod naming;
pub mod types;

pub use config::BridgeConfig;
pub use engine::{
    Backpressure, BridgeInstance, Coordinator, InstanceHandle, InstanceState, Occupancy,
    PeriodStatus,
};
pub use error::{BridgeError, BridgeResult};
pub use types::*;
