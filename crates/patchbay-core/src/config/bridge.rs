//! Bridge settings

use serde::{Deserialize, Serialize};

/// Default hardware client name
pub const DEFAULT_CLIENT_NAME: &str = "patchbay";

/// Default salt for generated port names
pub const DEFAULT_PORT_NAME_SALT: &str = "patchbay port names";

/// Hardware periods of queued playback before an instance counts as backlogged
pub const DEFAULT_BACKLOG_PERIODS: usize = 8;

/// Host voltage corresponding to a full-scale hardware sample
pub const DEFAULT_VOLTAGE_SCALE: f32 = 10.0;

/// Bridge configuration
///
/// Missing fields in a config file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the client on the audio server
    pub client_name: String,
    /// Salt mixed into generated fallback port names
    pub port_name_salt: String,
    /// Backlog threshold, in hardware periods
    pub backlog_periods: usize,
    /// Host volts per unit hardware sample
    pub voltage_scale: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            port_name_salt: DEFAULT_PORT_NAME_SALT.to_string(),
            backlog_periods: DEFAULT_BACKLOG_PERIODS,
            voltage_scale: DEFAULT_VOLTAGE_SCALE,
        }
    }
}

impl BridgeConfig {
    /// Set the client name (builder pattern)
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set the port name salt (builder pattern)
    pub fn with_port_name_salt(mut self, salt: impl Into<String>) -> Self {
        self.port_name_salt = salt.into();
        self
    }

    /// Set the backlog threshold in periods (builder pattern)
    pub fn with_backlog_periods(mut self, periods: usize) -> Self {
        self.backlog_periods = periods;
        self
    }

    /// Set the voltage scale (builder pattern)
    pub fn with_voltage_scale(mut self, scale: f32) -> Self {
        self.voltage_scale = scale;
        self
    }

    /// Hardware-rate occupancy threshold for a given period size
    pub fn backlog_threshold(&self, buffer_size: usize) -> usize {
        self.backlog_periods.saturating_mul(buffer_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.client_name, "patchbay");
        assert_eq!(config.backlog_periods, 8);
        assert_eq!(config.voltage_scale, 10.0);
        assert_eq!(config.backlog_threshold(256), 2048);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: BridgeConfig = serde_yaml::from_str("client_name: rack\n").unwrap();
        assert_eq!(config.client_name, "rack");
        assert_eq!(config.port_name_salt, DEFAULT_PORT_NAME_SALT);
        assert_eq!(config.backlog_periods, DEFAULT_BACKLOG_PERIODS);
    }
}
