//! Bridge configuration
//!
//! - [`BridgeConfig`]: client name, naming salt, backlog threshold, voltage scale
//! - Generic YAML config loading/saving
//! - Standard config paths
//!
//! # Usage
//!
//! ```ignore
//! use patchbay_core::config::{default_config_path, load_config, save_config, BridgeConfig};
//!
//! let path = default_config_path("bridge.yaml");
//! let config: BridgeConfig = load_config(&path);
//! save_config(&config.with_backlog_periods(4), &path)?;
//! ```

mod bridge;
mod io;
mod paths;

pub use bridge::{
    BridgeConfig, DEFAULT_BACKLOG_PERIODS, DEFAULT_CLIENT_NAME, DEFAULT_PORT_NAME_SALT,
    DEFAULT_VOLTAGE_SCALE,
};
pub use io::{load_config, read_config, save_config};
pub use paths::{default_config_dir, default_config_path};
