//! In-memory hardware backend
//!
//! Stands in for an audio server in tests and headless runs. Ports own plain
//! sample vectors; a [`MockPeriod`] exposes them to the realtime pass the way
//! a real server exposes its port buffers for one callback.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use super::backend::{AudioBackend, PeriodScope};
use super::error::{BackendError, BackendResult};
use crate::types::{PortDirection, Sample};

/// Default mock sample rate
pub const MOCK_SAMPLE_RATE: u32 = 48_000;

/// Default mock period size
pub const MOCK_BUFFER_SIZE: usize = 256;

/// Port handle of [`MockBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockPort {
    id: usize,
    name: String,
    direction: PortDirection,
    buffer: Option<Vec<Sample>>,
}

impl MockPort {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Port buffer, `None` when nulled
    pub fn buffer(&self) -> Option<&[Sample]> {
        self.buffer.as_deref()
    }

    pub fn buffer_mut(&mut self) -> Option<&mut [Sample]> {
        self.buffer.as_deref_mut()
    }

    /// Replace the port buffer; `None` simulates a null handle
    pub fn set_buffer(&mut self, buffer: Option<Vec<Sample>>) {
        self.buffer = buffer;
    }
}

/// Hardware backend with no server behind it
///
/// Liveness, rate and period size can be changed at any time. Rename failures
/// and slow renames (a server round trip) can be injected. Port names must be unique per backend, as on a real server.
#[derive(Debug)]
pub struct MockBackend {
    alive: AtomicBool,
    sample_rate: AtomicU32,
    buffer_size: AtomicUsize,
    fail_renames: AtomicBool,
    rename_delay_us: AtomicU64,
    next_id: AtomicUsize,
    names: Mutex<HashSet<String>>,
}

impl MockBackend {
    /// Live backend at the default rate and period size
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            sample_rate: AtomicU32::new(MOCK_SAMPLE_RATE),
            buffer_size: AtomicUsize::new(MOCK_BUFFER_SIZE),
            fail_renames: AtomicBool::new(false),
            rename_delay_us: AtomicU64::new(0),
            next_id: AtomicUsize::new(0),
            names: Mutex::new(HashSet::new()),
        }
    }

    /// Backend that was unreachable at startup
    pub fn offline() -> Self {
        let backend = Self::new();
        backend.set_alive(false);
        backend
    }

    /// Set the sample rate (builder pattern)
    pub fn with_sample_rate(self, rate: u32) -> Self {
        self.set_sample_rate(rate);
        self
    }

    /// Set the period size (builder pattern)
    pub fn with_buffer_size(self, frames: usize) -> Self {
        self.set_buffer_size(frames);
        self
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    pub fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate, Ordering::Relaxed);
    }

    pub fn set_buffer_size(&self, frames: usize) {
        self.buffer_size.store(frames, Ordering::Relaxed);
    }

    /// Make every following rename fail
    pub fn set_fail_renames(&self, fail: bool) {
        self.fail_renames.store(fail, Ordering::Relaxed);
    }

    /// Make every following rename take at least `delay`
    pub fn set_rename_delay(&self, delay: Duration) {
        let micros = u64::try_from(delay.as_micros()).unwrap_or(u64::MAX);
        self.rename_delay_us.store(micros, Ordering::Relaxed);
    }

    /// Number of currently registered ports
    pub fn port_count(&self) -> usize {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether a port with this name is registered
    pub fn has_port(&self, name: &str) -> bool {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MockBackend {
    type Port = MockPort;

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size.load(Ordering::Relaxed)
    }

    fn register_port(&self, name: &str, direction: PortDirection) -> BackendResult<MockPort> {
        if !self.is_alive() {
            return Err(BackendError::NotRunning);
        }
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        if !names.insert(name.to_string()) {
            return Err(BackendError::DuplicatePort(name.to_string()));
        }
        Ok(MockPort {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            direction,
            buffer: Some(vec![0.0; self.buffer_size()]),
        })
    }

    fn rename_port(&self, port: &mut MockPort, name: &str) -> BackendResult<()> {
        if !self.is_alive() {
            return Err(BackendError::NotRunning);
        }
        let delay = self.rename_delay_us.load(Ordering::Relaxed);
        if delay > 0 {
            thread::sleep(Duration::from_micros(delay));
        }
        if self.fail_renames.load(Ordering::Relaxed) {
            return Err(BackendError::PortRename {
                name: name.to_string(),
                reason: "rename rejected by server (code -1)".to_string(),
            });
        }
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        if port.name == name {
            return Ok(());
        }
        if !names.insert(name.to_string()) {
            return Err(BackendError::DuplicatePort(name.to_string()));
        }
        names.remove(&port.name);
        port.name = name.to_string();
        Ok(())
    }

    fn unregister_port(&self, port: MockPort) -> BackendResult<()> {
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        if names.remove(&port.name) {
            Ok(())
        } else {
            Err(BackendError::PortUnregister {
                name: port.name,
                reason: "unknown port".to_string(),
            })
        }
    }
}

/// One simulated hardware period
#[derive(Debug, Clone, Copy)]
pub struct MockPeriod {
    pub frames: usize,
}

impl MockPeriod {
    pub fn new(frames: usize) -> Self {
        Self { frames }
    }
}

impl PeriodScope<MockPort> for MockPeriod {
    fn frames(&self) -> usize {
        self.frames
    }

    fn capture<'a>(&'a self, port: &'a MockPort) -> Option<&'a [Sample]> {
        let buffer = port.buffer.as_deref()?;
        Some(&buffer[..self.frames.min(buffer.len())])
    }

    fn playback<'a>(&'a self, port: &'a mut MockPort) -> Option<&'a mut [Sample]> {
        let buffer = port.buffer.as_deref_mut()?;
        let n = self.frames.min(buffer.len());
        Some(&mut buffer[..n])
    }
}
