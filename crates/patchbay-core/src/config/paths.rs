//! Standard locations for patchbay configuration files

use std::path::PathBuf;

/// Directory holding patchbay configuration
///
/// Returns: `~/.config/patchbay` (platform config dir), or `./patchbay`
/// when no config dir is known.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("patchbay")
}

/// Path of a config file inside [`default_config_dir`]
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}
