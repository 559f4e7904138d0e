//! YAML config file I/O
//!
//! [`load_config`] never fails: a missing file means defaults, a broken file
//! means defaults plus a warning. [`read_config`] is the strict variant for
//! callers that want to report the problem themselves.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read and parse a YAML config file, failing on any I/O or parse error
pub fn read_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

/// Load a YAML config file, falling back to `T::default()`
///
/// ```ignore
/// let config: BridgeConfig = load_config(Path::new("bridge.yaml"));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("No config at {:?}, using defaults", path);
        return T::default();
    }

    match read_config(path) {
        Ok(config) => {
            log::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("{:#}, using defaults", e);
            T::default()
        }
    }
}

/// Write a config as YAML, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("Saved config to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config: BridgeConfig = load_config(Path::new("/nonexistent/patchbay/bridge.yaml"));
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bridge.yaml");

        let config = BridgeConfig::default()
            .with_client_name("studio")
            .with_backlog_periods(3);
        save_config(&config, &path).unwrap();

        let loaded: BridgeConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.yaml");
        std::fs::write(&path, "backlog_periods: [not, a, number]").unwrap();

        assert!(read_config::<BridgeConfig>(&path).is_err());
        let config: BridgeConfig = load_config(&path);
        assert_eq!(config, BridgeConfig::default());
    }
}
