//! Shared registry and backpressure protocol
//!
//! One [`Coordinator`] is shared (via `Arc`) by the hardware callback and
//! every bridge instance. It owns the backend, the registry of live instances
//! and the stall/release machinery:
//!
//! ```text
//!  processing ticks (one thread per instance)       hardware callback
//!  ───────────────────────────────────────────      ─────────────────
//!  tick → backlogged? ──no──► return Clear          process_period()
//!            │ yes                                    lock registry
//!            ▼                                        transfer every instance
//!  lock registry                                      reset every latch
//!  latch Clear→Signaled? ─yes─► blocked += 1          blocked = 0, epoch += 1
//!  blocked == instances? ─no──► return Signaled       unlock, notify_all
//!            │ yes                                          │
//!            ▼                                              │
//!  wait until epoch changes ◄───────────────────────────────┘
//!  return Stalled
//! ```
//!
//! A stalled tick is released by the next completed hardware period and
//! never waits across two. There is no timeout: if the hardware callback
//! stops firing, stalled ticks stay blocked.

use std::array;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use super::instance::InstanceShared;
use super::latch::{BacklogLatch, LatchState};
use super::routing::silence_lanes;
use super::{lock, try_lock};
use crate::audio::{AudioBackend, Lane, PeriodScope};
use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::naming::PortNamer;
use crate::types::{PortDirection, HARDWARE_PORTS};

// ═══════════════════════════════════════════════════════════════════════
// Handles and results
// ═══════════════════════════════════════════════════════════════════════

/// Stable handle of a registered instance (slot index + generation)
///
/// A handle outlives its instance harmlessly: once the slot is reused the
/// generation no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    index: u32,
    generation: u32,
}

impl InstanceHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// What the backlog protocol did during a processing tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Not backlogged
    Clear,
    /// Backlogged, but at least one instance is still keeping up
    Signaled,
    /// Every instance was backlogged; the tick waited for a hardware period
    Stalled,
}

/// Result of one hardware period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodStatus {
    Continue,
    /// Backend is gone; the callback should stop
    Quit,
}

// ═══════════════════════════════════════════════════════════════════════
// Registry arena
// ═══════════════════════════════════════════════════════════════════════

struct Slot<P> {
    generation: u32,
    entry: Option<Arc<InstanceShared<P>>>,
}

pub(crate) struct Registry<P> {
    slots: Vec<Slot<P>>,
    free: Vec<u32>,
    live: usize,
}

impl<P> Registry<P> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    fn insert(&mut self, shared: Arc<InstanceShared<P>>) -> InstanceHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(shared);
            return InstanceHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(shared),
        });
        InstanceHandle {
            index,
            generation: 0,
        }
    }

    fn remove(&mut self, handle: InstanceHandle) -> Option<Arc<InstanceShared<P>>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(entry)
    }

    fn contains(&self, handle: InstanceHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.entry.is_some())
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<InstanceShared<P>>> {
        self.slots.iter().filter_map(|slot| slot.entry.as_ref())
    }

    fn len(&self) -> usize {
        self.live
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Coordinator
// ═══════════════════════════════════════════════════════════════════════

/// Registry of live instances plus the shared backlog state
pub struct Coordinator<B: AudioBackend> {
    backend: B,
    config: BridgeConfig,
    namer: PortNamer,
    registry: Mutex<Registry<B::Port>>,
    /// Instances whose latch is Signaled in the current period
    blocked: AtomicUsize,
    /// Processing threads currently waiting in the stall
    stalled: AtomicUsize,
    /// Completed hardware periods; only advanced with the registry locked
    epoch: AtomicU64,
    wake: Condvar,
    next_serial: AtomicU64,
}

impl<B: AudioBackend> Coordinator<B> {
    /// Create a coordinator around `backend`
    pub fn new(backend: B, config: BridgeConfig) -> BridgeResult<Arc<Self>> {
        let namer = PortNamer::new(&config.port_name_salt)?;
        if backend.is_alive() {
            log::info!(
                "Coordinator ready (sample rate: {}Hz, period: {} frames, backlog threshold: {} frames)",
                backend.sample_rate(),
                backend.buffer_size(),
                config.backlog_threshold(backend.buffer_size())
            );
        } else {
            log::warn!("Audio backend unavailable, bridge instances will be inactive");
        }
        Ok(Arc::new(Self {
            backend,
            config,
            namer,
            registry: Mutex::new(Registry::new()),
            blocked: AtomicUsize::new(0),
            stalled: AtomicUsize::new(0),
            epoch: AtomicU64::new(0),
            wake: Condvar::new(),
            next_serial: AtomicU64::new(1),
        }))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn namer(&self) -> &PortNamer {
        &self.namer
    }

    /// Number of registered instances
    pub fn instance_count(&self) -> usize {
        self.lock_registry().len()
    }

    /// Whether `handle` still refers to a registered instance
    pub fn is_registered(&self, handle: InstanceHandle) -> bool {
        self.lock_registry().contains(handle)
    }

    /// Instances that have signaled backlog since the last hardware period
    pub fn blocked_count(&self) -> usize {
        self.blocked.load(Ordering::Acquire)
    }

    /// Processing threads currently stalled
    pub fn stalled_threads(&self) -> usize {
        self.stalled.load(Ordering::Acquire)
    }

    /// Completed hardware periods
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Current backlog threshold in hardware-rate frames
    pub fn backlog_threshold(&self) -> usize {
        self.config.backlog_threshold(self.backend.buffer_size())
    }

    pub(crate) fn next_serial(&self) -> u64 {
        self.next_serial.fetch_add(1, Ordering::Relaxed)
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry<B::Port>> {
        lock(&self.registry)
    }

    /// Add an instance and wipe every registered instance's buffers
    pub(crate) fn register(&self, shared: Arc<InstanceShared<B::Port>>) -> InstanceHandle {
        let mut registry = self.lock_registry();
        let handle = registry.insert(shared);
        for instance in registry.iter() {
            instance.wipe();
        }
        log::debug!(
            "Registered instance {:?}, wiped buffers of {} instance(s)",
            handle,
            registry.len()
        );
        handle
    }

    /// Remove an instance; other instances keep their buffers
    pub(crate) fn unregister(&self, handle: InstanceHandle) {
        let mut registry = self.lock_registry();
        if let Some(shared) = registry.remove(handle) {
            if shared.latch.reset() == LatchState::Signaled {
                let _ = self
                    .blocked
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
            }
            log::debug!("Unregistered instance {:?}", handle);
        }
    }

    /// Record that the instance owning `latch` is backlogged
    ///
    /// Stalls the calling thread when every registered instance has signaled,
    /// until the next hardware period completes.
    pub(crate) fn report_backlogged(&self, latch: &BacklogLatch) -> Backpressure {
        let mut registry = self.lock_registry();
        if latch.try_signal() {
            self.blocked.fetch_add(1, Ordering::AcqRel);
        }
        if self.blocked.load(Ordering::Acquire) < registry.len() {
            return Backpressure::Signaled;
        }

        let seen = self.epoch.load(Ordering::Acquire);
        self.stalled.fetch_add(1, Ordering::AcqRel);
        while self.epoch.load(Ordering::Acquire) == seen {
            registry = self.wake.wait(registry).unwrap_or_else(|e| e.into_inner());
        }
        self.stalled.fetch_sub(1, Ordering::AcqRel);
        Backpressure::Stalled
    }

    /// Run one hardware period over every registered instance
    ///
    /// Called from the hardware callback. Performs no allocation and logs
    /// nothing. The registry lock is the only blocking operation: an
    /// instance whose port table is busy is served with null handles, and
    /// one whose queue halves are busy is treated as an underrun.
    pub fn process_period<S>(&self, scope: &S) -> PeriodStatus
    where
        S: PeriodScope<B::Port>,
    {
        if !self.backend.is_alive() {
            return PeriodStatus::Quit;
        }
        let frames = scope.frames();

        let registry = self.lock_registry();
        for instance in registry.iter() {
            let mut ports = try_lock(&instance.ports);
            let mut lanes: [Lane<'_>; HARDWARE_PORTS] = array::from_fn(|_| Lane::Missing);
            if let Some(ports) = ports.as_deref_mut() {
                let role = instance.routing.role();
                for (lane, (slot, port)) in lanes.iter_mut().zip(ports.iter_mut()).enumerate() {
                    let Some(port) = port.as_mut() else {
                        continue;
                    };
                    let resolved = match role.port_direction(lane) {
                        PortDirection::Playback => scope.playback(port).map(Lane::Playback),
                        PortDirection::Capture => scope.capture(port).map(Lane::Capture),
                    };
                    *slot = resolved.unwrap_or_default();
                }
            }
            match try_lock(&instance.realtime) {
                Some(mut hardware) => {
                    instance
                        .routing
                        .transfer_period(&mut hardware, &mut lanes, frames)
                }
                None => silence_lanes(&mut lanes, frames),
            }
        }

        // End of period: every latch back to Clear, then release stalled ticks
        for instance in registry.iter() {
            instance.latch.reset();
        }
        self.blocked.store(0, Ordering::Release);
        self.epoch.fetch_add(1, Ordering::AcqRel);
        drop(registry);
        self.wake.notify_all();

        PeriodStatus::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MockBackend, MockPeriod};
    use crate::engine::BridgeInstance;
    use crate::types::{HostPorts, Role};

    fn coordinator(buffer_size: usize) -> Arc<Coordinator<MockBackend>> {
        let backend = MockBackend::new().with_buffer_size(buffer_size);
        Coordinator::new(backend, BridgeConfig::default()).unwrap()
    }

    #[test]
    fn test_handles_are_generational() {
        let coordinator = coordinator(64);
        let first = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
        let old = first.handle();
        drop(first);
        assert!(!coordinator.is_registered(old));

        let second = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
        assert_eq!(second.handle().index(), old.index());
        assert_ne!(second.handle().generation(), old.generation());
        assert!(coordinator.is_registered(second.handle()));
        assert!(!coordinator.is_registered(old));
    }

    #[test]
    fn test_signal_without_full_agreement_does_not_stall() {
        // Period of 1 frame: threshold is 8, so 16 ticks overfill the buffer
        let coordinator = coordinator(1);
        let mut busy = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
        let _idle = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);

        let mut ports = HostPorts::default();
        let mut results = Vec::new();
        for _ in 0..32 {
            results.push(busy.process(48_000, &mut ports));
        }
        assert_eq!(results[0], Backpressure::Clear);
        assert_eq!(results[15], Backpressure::Signaled);
        assert_eq!(results[31], Backpressure::Signaled);
        assert_eq!(coordinator.blocked_count(), 1);
        assert!(busy.is_backlogged());
    }

    #[test]
    fn test_period_resets_backlog_state() {
        let coordinator = coordinator(1);
        let mut busy = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
        let _idle = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);

        let mut ports = HostPorts::default();
        for _ in 0..16 {
            busy.process(48_000, &mut ports);
        }
        assert_eq!(coordinator.blocked_count(), 1);

        assert_eq!(
            coordinator.process_period(&MockPeriod::new(1)),
            PeriodStatus::Continue
        );
        assert_eq!(coordinator.blocked_count(), 0);
        assert_eq!(coordinator.epoch(), 1);
        assert!(!busy.is_backlogged());
    }

    #[test]
    fn test_unregister_signaled_instance_releases_count() {
        let coordinator = coordinator(1);
        let mut busy = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
        let _idle = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);

        let mut ports = HostPorts::default();
        for _ in 0..16 {
            busy.process(48_000, &mut ports);
        }
        assert_eq!(coordinator.blocked_count(), 1);
        drop(busy);
        assert_eq!(coordinator.blocked_count(), 0);
        assert_eq!(coordinator.instance_count(), 1);
    }

    #[test]
    fn test_dead_backend_quits_period() {
        let backend = MockBackend::offline();
        let coordinator = Coordinator::new(backend, BridgeConfig::default()).unwrap();
        assert_eq!(
            coordinator.process_period(&MockPeriod::new(64)),
            PeriodStatus::Quit
        );
        assert_eq!(coordinator.epoch(), 0);
    }
}
