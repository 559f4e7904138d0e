//! Hardware audio backends
//!
//! The engine talks to the audio server only through [`AudioBackend`] and
//! [`PeriodScope`]:
//!
//! - **Linux**: native JACK client (with the `jack-backend` feature)
//! - **Everywhere**: [`MockBackend`], an in-memory server for tests and
//!   headless runs
//!
//! # Example Usage
//!
//! ```ignore
//! use patchbay_core::audio::start_jack_bridge;
//! use patchbay_core::{BridgeConfig, BridgeInstance, HostPorts, Role};
//!
//! let bridge = start_jack_bridge(BridgeConfig::default())?;
//! let mut module = BridgeInstance::new(bridge.coordinator(), Role::Duplex);
//!
//! // Host graph thread, once per sample
//! let mut ports = HostPorts::default();
//! module.process(44_100, &mut ports);
//! ```

mod backend;
mod error;
mod mock;

#[cfg(all(target_os = "linux", feature = "jack-backend"))]
mod jack_backend;

pub use backend::{AudioBackend, Lane, PeriodScope};
pub use error::{BackendError, BackendResult};
pub use mock::{MockBackend, MockPeriod, MockPort, MOCK_BUFFER_SIZE, MOCK_SAMPLE_RATE};

#[cfg(all(target_os = "linux", feature = "jack-backend"))]
pub use jack_backend::{start_jack_bridge, JackBackend, JackBridge, JackPeriod, JackPort};
