//! Native JACK backend for Linux
//!
//! One JACK client per coordinator. Every bridge instance registers its eight
//! ports on that client; the client's process callback runs the
//! coordinator's realtime pass over all of them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   register/rename    ┌─────────────────────┐
//! │  BridgeInstance  │─────────────────────►│     JackBackend     │
//! │  (host threads)  │                      │   (client, ports)   │
//! └────────┬─────────┘                      └──────────┬──────────┘
//!          │ process()                                 │ process callback
//!          ▼                                           ▼
//! ┌──────────────────┐   process_period()   ┌─────────────────────┐
//! │   Coordinator    │◄─────────────────────│   JACK RT thread    │
//! └──────────────────┘                      └─────────────────────┘
//! ```
//!
//! The processor holds an `Arc` of the coordinator, which owns the backend,
//! which owns the active client. [`JackBridge`] breaks that cycle by
//! deactivating the client when dropped.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jack::{AudioIn, AudioOut, Client, ClientOptions, Control, Port, ProcessScope};

use super::backend::{AudioBackend, PeriodScope};
use super::error::{BackendError, BackendResult};
use crate::config::BridgeConfig;
use crate::engine::{Coordinator, PeriodStatus};
use crate::error::BridgeResult;
use crate::types::{PortDirection, Sample};

/// Port handle of [`JackBackend`]
pub enum JackPort {
    Playback(Port<AudioOut>),
    Capture(Port<AudioIn>),
}

impl JackPort {
    fn set_name(&mut self, name: &str) -> Result<(), jack::Error> {
        match self {
            JackPort::Playback(port) => port.set_name(name),
            JackPort::Capture(port) => port.set_name(name),
        }
    }

    /// Full port name as the server reports it
    pub fn name(&self) -> String {
        let name = match self {
            JackPort::Playback(port) => port.name(),
            JackPort::Capture(port) => port.name(),
        };
        name.unwrap_or_default()
    }
}

enum ClientState {
    Inactive(Client),
    Active(jack::AsyncClient<JackNotifications, JackProcessor>),
    Closed,
}

/// JACK client shared by all bridge instances
pub struct JackBackend {
    state: Mutex<ClientState>,
    alive: AtomicBool,
    sample_rate: AtomicU32,
    buffer_size: AtomicUsize,
}

impl JackBackend {
    /// Open a client without starting a server
    ///
    /// If no server is reachable the backend is returned dead and every
    /// bridge instance built on it stays inactive.
    pub fn open(client_name: &str) -> Self {
        Self::try_open(client_name).unwrap_or_else(|e| {
            log::warn!("JACK server unavailable: {}", e);
            Self {
                state: Mutex::new(ClientState::Closed),
                alive: AtomicBool::new(false),
                sample_rate: AtomicU32::new(0),
                buffer_size: AtomicUsize::new(0),
            }
        })
    }

    /// Open a client without starting a server, failing if none is reachable
    pub fn try_open(client_name: &str) -> BackendResult<Self> {
        let (client, _status) = Client::new(client_name, ClientOptions::NO_START_SERVER)
            .map_err(|e| BackendError::ClientOpen {
                name: client_name.to_string(),
                reason: e.to_string(),
            })?;
        let sample_rate = client.sample_rate() as u32;
        let buffer_size = client.buffer_size() as usize;
        log::info!(
            "JACK client '{}' created (sample rate: {}Hz, buffer: {} frames)",
            client.name(),
            sample_rate,
            buffer_size
        );
        Ok(Self {
            state: Mutex::new(ClientState::Inactive(client)),
            alive: AtomicBool::new(true),
            sample_rate: AtomicU32::new(sample_rate),
            buffer_size: AtomicUsize::new(buffer_size),
        })
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the process callback, driving `coordinator`'s realtime pass
    pub fn activate(&self, coordinator: Arc<Coordinator<JackBackend>>) -> BackendResult<()> {
        let mut state = self.state();
        let client = match std::mem::replace(&mut *state, ClientState::Closed) {
            ClientState::Inactive(client) => client,
            other => {
                *state = other;
                return Err(BackendError::Activation("client is not inactive".to_string()));
            }
        };
        match client.activate_async(JackNotifications, JackProcessor { coordinator }) {
            Ok(active) => {
                *state = ClientState::Active(active);
                log::info!("JACK client activated");
                Ok(())
            }
            Err(e) => {
                self.alive.store(false, Ordering::Release);
                Err(BackendError::Activation(e.to_string()))
            }
        }
    }

    /// Deactivate and close the client
    pub fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.state(), ClientState::Closed);
        self.alive.store(false, Ordering::Release);
        if let ClientState::Active(active) = previous {
            match active.deactivate() {
                Ok(_) => log::info!("JACK client deactivated"),
                Err(e) => log::warn!("Failed to deactivate JACK client: {}", e),
            }
        }
    }
}

impl AudioBackend for JackBackend {
    type Port = JackPort;

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size.load(Ordering::Relaxed)
    }

    fn register_port(&self, name: &str, direction: PortDirection) -> BackendResult<JackPort> {
        let state = self.state();
        let client = match &*state {
            ClientState::Inactive(client) => client,
            ClientState::Active(active) => active.as_client(),
            ClientState::Closed => return Err(BackendError::NotRunning),
        };
        let port = match direction {
            PortDirection::Playback => client
                .register_port(name, AudioOut::default())
                .map(JackPort::Playback),
            PortDirection::Capture => client
                .register_port(name, AudioIn::default())
                .map(JackPort::Capture),
        };
        port.map_err(|e| BackendError::PortRegister {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    fn rename_port(&self, port: &mut JackPort, name: &str) -> BackendResult<()> {
        if !self.is_alive() {
            return Err(BackendError::NotRunning);
        }
        port.set_name(name).map_err(|e| BackendError::PortRename {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    fn unregister_port(&self, port: JackPort) -> BackendResult<()> {
        let state = self.state();
        let client = match &*state {
            ClientState::Inactive(client) => client,
            ClientState::Active(active) => active.as_client(),
            // Closing the client already released its ports
            ClientState::Closed => return Ok(()),
        };
        let name = port.name();
        let result = match port {
            JackPort::Playback(port) => client.unregister_port(port),
            JackPort::Capture(port) => client.unregister_port(port),
        };
        result.map_err(|e| BackendError::PortUnregister {
            name,
            reason: e.to_string(),
        })
    }
}

/// Port buffers of one JACK process cycle
pub struct JackPeriod<'a> {
    ps: &'a ProcessScope,
}

impl<'a> JackPeriod<'a> {
    pub fn new(ps: &'a ProcessScope) -> Self {
        Self { ps }
    }
}

impl PeriodScope<JackPort> for JackPeriod<'_> {
    fn frames(&self) -> usize {
        self.ps.n_frames() as usize
    }

    fn capture<'b>(&'b self, port: &'b JackPort) -> Option<&'b [Sample]> {
        match port {
            JackPort::Capture(port) => Some(port.as_slice(self.ps)),
            JackPort::Playback(_) => None,
        }
    }

    fn playback<'b>(&'b self, port: &'b mut JackPort) -> Option<&'b mut [Sample]> {
        match port {
            JackPort::Playback(port) => Some(port.as_mut_slice(self.ps)),
            JackPort::Capture(_) => None,
        }
    }
}

/// JACK process handler
///
/// Publishes the current rate and period size, then runs the realtime pass.
struct JackProcessor {
    coordinator: Arc<Coordinator<JackBackend>>,
}

impl jack::ProcessHandler for JackProcessor {
    fn process(&mut self, client: &Client, ps: &ProcessScope) -> Control {
        let backend = self.coordinator.backend();
        backend
            .sample_rate
            .store(client.sample_rate() as u32, Ordering::Relaxed);
        backend
            .buffer_size
            .store(ps.n_frames() as usize, Ordering::Relaxed);

        match self.coordinator.process_period(&JackPeriod::new(ps)) {
            PeriodStatus::Continue => Control::Continue,
            PeriodStatus::Quit => Control::Quit,
        }
    }
}

/// JACK notification handler
struct JackNotifications;

impl jack::NotificationHandler for JackNotifications {
    fn sample_rate(&mut self, _client: &Client, srate: jack::Frames) -> Control {
        log::info!("JACK sample rate changed to: {}", srate);
        Control::Continue
    }

    fn xrun(&mut self, _client: &Client) -> Control {
        log::warn!("JACK xrun detected");
        Control::Continue
    }
}

/// Running JACK bridge; dropping it deactivates the client
pub struct JackBridge {
    coordinator: Arc<Coordinator<JackBackend>>,
}

impl JackBridge {
    /// Coordinator to build bridge instances on
    pub fn coordinator(&self) -> Arc<Coordinator<JackBackend>> {
        Arc::clone(&self.coordinator)
    }
}

impl Drop for JackBridge {
    fn drop(&mut self) {
        self.coordinator.backend().shutdown();
    }
}

/// Open the JACK client and start the realtime pass
///
/// An unreachable server is not an error: the returned bridge is inactive
/// and instances built on it do nothing.
pub fn start_jack_bridge(config: BridgeConfig) -> BridgeResult<JackBridge> {
    let backend = JackBackend::open(&config.client_name);
    let coordinator = Coordinator::new(backend, config)?;
    if coordinator.backend().is_alive() {
        coordinator.backend().activate(Arc::clone(&coordinator))?;
    }
    Ok(JackBridge { coordinator })
}
