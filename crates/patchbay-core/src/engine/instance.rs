//! Bridge instances
//!
//! A [`BridgeInstance`] is one module in the host graph: a role, eight
//! hardware ports, four buffers (host rate and hardware rate, each in two
//! directions), two resamplers and a backlog latch.
//!
//! The host-rate buffers belong to the processing tick. The hardware-rate
//! buffers are lock-free queues with one half on the tick side and the other
//! half reachable by the hardware callback through the [`Coordinator`].
//! The hardware callback only ever `try_lock`s its halves and the port
//! table; on contention it treats the instance as having no ports or no
//! queued audio for that period.
//!
//! Lock order for non-realtime code is registry, then tick side, then
//! realtime halves. The processing tick releases the tick side before it
//! touches the registry.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::coordinator::{Backpressure, Coordinator, InstanceHandle};
use super::latch::BacklogLatch;
use super::lock;
use super::queue::HardwareEnds;
use super::resampler::SampleRateConverter;
use super::ring_buffer::RingBuffer;
use super::routing::{routing_for, RoleRouting, Tick};
use crate::audio::AudioBackend;
use crate::error::{BridgeError, BridgeResult};
use crate::types::{Frame, HostPorts, Role, HARDWARE_PORTS, HOST_BUFFER_FRAMES, LANES};

/// Host-rate buffers and resamplers
pub(crate) struct HostSide {
    pub input: RingBuffer<Frame, HOST_BUFFER_FRAMES>,
    pub output: RingBuffer<Frame, HOST_BUFFER_FRAMES>,
    pub input_converter: SampleRateConverter,
    pub output_converter: SampleRateConverter,
}

impl HostSide {
    fn new() -> Self {
        Self {
            input: RingBuffer::new(),
            output: RingBuffer::new(),
            input_converter: SampleRateConverter::new(LANES),
            output_converter: SampleRateConverter::new(LANES),
        }
    }

    fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
        self.input_converter.reset();
        self.output_converter.reset();
    }
}

/// Everything the processing tick owns
pub(crate) struct TickSide {
    pub host: HostSide,
    pub hardware: HardwareEnds,
}

/// State reachable from both the instance and the coordinator
pub(crate) struct InstanceShared<P> {
    pub routing: &'static dyn RoleRouting,
    pub tick: Mutex<TickSide>,
    /// Hardware callback's halves of the queues; otherwise only locked by
    /// registration wipes, which hold the registry
    pub realtime: Mutex<HardwareEnds>,
    pub ports: Mutex<[Option<P>; HARDWARE_PORTS]>,
    pub latch: BacklogLatch,
}

impl<P> InstanceShared<P> {
    fn new(role: Role, ports: [Option<P>; HARDWARE_PORTS]) -> Self {
        let routing = routing_for(role);
        let (tick_ends, realtime_ends) = HardwareEnds::split(routing.buffer_flows());
        Self {
            routing,
            tick: Mutex::new(TickSide {
                host: HostSide::new(),
                hardware: tick_ends,
            }),
            realtime: Mutex::new(realtime_ends),
            ports: Mutex::new(ports),
            latch: BacklogLatch::new(),
        }
    }

    /// Empty all four buffers and forget resampler history
    ///
    /// Caller holds the registry, so the hardware callback is not running.
    pub fn wipe(&self) {
        let mut tick = lock(&self.tick);
        tick.host.clear();
        tick.hardware.clear();
        lock(&self.realtime).clear();
    }

    pub fn occupancy(&self) -> Occupancy {
        let tick = lock(&self.tick);
        Occupancy {
            host_input: tick.host.input.len(),
            host_output: tick.host.output.len(),
            hardware_input: tick.hardware.input.len(),
            hardware_output: tick.hardware.output.len(),
        }
    }
}

/// Frames held in each of an instance's four buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occupancy {
    pub host_input: usize,
    pub host_output: usize,
    pub hardware_input: usize,
    pub hardware_output: usize,
}

impl Occupancy {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Persisted per-instance state: up to 8 port names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(default)]
    pub port_names: Vec<String>,
}

/// One bridging module
pub struct BridgeInstance<B: AudioBackend> {
    coordinator: Arc<Coordinator<B>>,
    shared: Arc<InstanceShared<B::Port>>,
    handle: InstanceHandle,
    serial: u64,
    names: [String; HARDWARE_PORTS],
}

impl<B: AudioBackend> BridgeInstance<B> {
    /// Create an instance, register its ports and join the coordinator
    ///
    /// Joining wipes the buffers of every registered instance. With a dead
    /// backend no ports are created and processing is a no-op.
    pub fn new(coordinator: Arc<Coordinator<B>>, role: Role) -> Self {
        let serial = coordinator.next_serial();
        let names: [String; HARDWARE_PORTS] =
            std::array::from_fn(|lane| coordinator.namer().fallback_name(serial, lane));

        let backend = coordinator.backend();
        let ports: [Option<B::Port>; HARDWARE_PORTS] = std::array::from_fn(|lane| {
            if !backend.is_alive() {
                return None;
            }
            match backend.register_port(&names[lane], role.port_direction(lane)) {
                Ok(port) => Some(port),
                Err(e) => {
                    log::warn!("Port {} unavailable: {}", names[lane], e);
                    None
                }
            }
        });

        let shared = Arc::new(InstanceShared::new(role, ports));
        let handle = coordinator.register(Arc::clone(&shared));
        log::info!(
            "Created {} instance {} ({:?})",
            role.name(),
            coordinator.namer().instance_hash(serial),
            handle
        );

        Self {
            coordinator,
            shared,
            handle,
            serial,
            names,
        }
    }

    pub fn role(&self) -> Role {
        self.shared.routing.role()
    }

    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    /// Process-unique serial used for generated port names
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn coordinator(&self) -> &Arc<Coordinator<B>> {
        &self.coordinator
    }

    /// Run one host tick at `host_rate`
    ///
    /// Reads `ports.inputs`, writes `ports.outputs`. May block when every
    /// registered instance is backlogged, until the next hardware period.
    pub fn process(&mut self, host_rate: u32, ports: &mut HostPorts) -> Backpressure {
        let backend = self.coordinator.backend();
        if !backend.is_alive() {
            return Backpressure::Clear;
        }
        let config = self.coordinator.config();

        let backlogged = {
            let mut side = lock(&self.shared.tick);
            let TickSide { host, hardware } = &mut *side;
            self.shared.routing.process_tick(Tick {
                host,
                hardware,
                ports,
                host_rate,
                hardware_rate: backend.sample_rate(),
                voltage_scale: config.voltage_scale,
                backlog_threshold: config.backlog_threshold(backend.buffer_size()),
            })
        };

        if backlogged {
            self.coordinator.report_backlogged(&self.shared.latch)
        } else {
            Backpressure::Clear
        }
    }

    /// Frames currently held in each buffer
    pub fn occupancy(&self) -> Occupancy {
        self.shared.occupancy()
    }

    /// Whether this instance has signaled backlog in the current period
    pub fn is_backlogged(&self) -> bool {
        self.shared.latch.is_signaled()
    }

    /// Run `f` with the instance's port handles (`None` where no port exists)
    ///
    /// While `f` runs the hardware callback sees this instance's ports as
    /// null handles.
    pub fn with_ports<R>(&self, f: impl FnOnce(&mut [Option<B::Port>; HARDWARE_PORTS]) -> R) -> R {
        f(&mut lock(&self.shared.ports))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Port names
    // ═══════════════════════════════════════════════════════════════════

    /// Generated name for `lane`
    pub fn fallback_name(&self, lane: usize) -> String {
        self.coordinator.namer().fallback_name(self.serial, lane)
    }

    /// Name shown for `lane`: the stored name, or the generated one
    pub fn display_name(&self, lane: usize) -> String {
        match self.names.get(lane) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.fallback_name(lane),
        }
    }

    /// Current names of all 8 ports
    pub fn port_names(&self) -> &[String; HARDWARE_PORTS] {
        &self.names
    }

    /// Rename the port at `lane`
    ///
    /// Unchanged names are a no-op. A rejected rename is logged and the
    /// previous name kept. With a dead backend only the stored name changes.
    ///
    /// The port is taken out of the port table for the duration of the
    /// backend call, so the hardware callback reads it as a null handle
    /// instead of waiting.
    pub fn rename_port(&mut self, lane: usize, name: &str) -> BridgeResult<()> {
        let current = self.names.get(lane).ok_or(BridgeError::InvalidLane(lane))?;
        if current == name {
            return Ok(());
        }

        let backend = self.coordinator.backend();
        if backend.is_alive() {
            let taken = lock(&self.shared.ports)[lane].take();
            if let Some(mut port) = taken {
                let renamed = backend.rename_port(&mut port, name);
                lock(&self.shared.ports)[lane] = Some(port);
                if let Err(e) = renamed {
                    log::warn!("Could not rename port {} to {}: {}", self.names[lane], name, e);
                    return Err(e.into());
                }
            }
        }

        log::info!("Renamed port {} to {}", self.names[lane], name);
        self.names[lane] = name.to_string();
        Ok(())
    }

    /// Persisted form of this instance
    pub fn save_state(&self) -> InstanceState {
        InstanceState {
            port_names: self.names.to_vec(),
        }
    }

    /// Apply saved port names
    ///
    /// Empty names are skipped. A name the backend rejects falls back to the
    /// generated name for that lane. Returns how many saved names were applied.
    pub fn restore_state(&mut self, state: &InstanceState) -> usize {
        let mut applied = 0;
        for (lane, name) in state.port_names.iter().take(HARDWARE_PORTS).enumerate() {
            if name.is_empty() {
                continue;
            }
            match self.rename_port(lane, name) {
                Ok(()) => applied += 1,
                Err(_) => {
                    let fallback = self.fallback_name(lane);
                    if let Err(e) = self.rename_port(lane, &fallback) {
                        log::warn!("Keeping port name {}: {}", self.names[lane], e);
                    }
                }
            }
        }
        applied
    }
}

impl<B: AudioBackend> Drop for BridgeInstance<B> {
    fn drop(&mut self) {
        self.coordinator.unregister(self.handle);

        let backend = self.coordinator.backend();
        let mut ports = lock(&self.shared.ports);
        for port in ports.iter_mut().filter_map(Option::take) {
            if let Err(e) = backend.unregister_port(port) {
                log::warn!("Failed to release port: {}", e);
            }
        }
        log::info!(
            "Destroyed {} instance {}",
            self.role().name(),
            self.coordinator.namer().instance_hash(self.serial)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MockBackend, MockPeriod};
    use crate::config::BridgeConfig;

    fn coordinator() -> Arc<Coordinator<MockBackend>> {
        Coordinator::new(MockBackend::new().with_buffer_size(16), BridgeConfig::default()).unwrap()
    }

    #[test]
    fn test_ports_registered_per_role() {
        let coordinator = coordinator();
        for role in Role::ALL {
            let instance = BridgeInstance::new(Arc::clone(&coordinator), role);
            instance.with_ports(|ports| {
                for (lane, port) in ports.iter().enumerate() {
                    let port = port.as_ref().unwrap();
                    assert_eq!(port.direction(), role.port_direction(lane));
                    assert_eq!(port.name(), instance.fallback_name(lane));
                }
            });
        }
        assert_eq!(coordinator.backend().port_count(), 0);
    }

    #[test]
    fn test_offline_backend_is_inert() {
        let coordinator =
            Coordinator::new(MockBackend::offline(), BridgeConfig::default()).unwrap();
        let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
        instance.with_ports(|ports| assert!(ports.iter().all(Option::is_none)));

        let mut ports = HostPorts::with_inputs([5.0; 8]);
        for _ in 0..64 {
            assert_eq!(instance.process(48_000, &mut ports), Backpressure::Clear);
        }
        assert!(instance.occupancy().is_empty());
        assert_eq!(ports.outputs, [0.0; 8]);
    }

    #[test]
    fn test_duplex_round_trip_through_hardware() {
        let coordinator = coordinator();
        let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);

        let mut ports = HostPorts::with_inputs([1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]);
        for _ in 0..16 {
            instance.process(48_000, &mut ports);
        }
        assert_eq!(instance.occupancy().hardware_output, 16);

        // Loop hardware playback back into capture
        instance.with_ports(|ports| {
            for lane in 0..LANES {
                let played = vec![0.5 * (lane + 1) as f32; 16];
                ports[lane + LANES].as_mut().unwrap().set_buffer(Some(played));
            }
        });
        coordinator.process_period(&MockPeriod::new(16));
        instance.with_ports(|ports| {
            let lane0 = ports[0].as_ref().unwrap().buffer().unwrap();
            assert!(lane0.iter().all(|&s| s == 0.1));
        });
        assert_eq!(instance.occupancy().hardware_input, 16);

        instance.process(48_000, &mut ports);
        assert_eq!(&ports.outputs[..LANES], &[5.0, 10.0, 15.0, 20.0]);
        assert_eq!(instance.occupancy().host_input, 15);
    }

    #[test]
    fn test_rename_and_persist() {
        let coordinator = coordinator();
        let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);

        instance.rename_port(2, "bass").unwrap();
        assert_eq!(instance.display_name(2), "bass");
        assert!(coordinator.backend().has_port("bass"));
        assert_eq!(instance.rename_port(9, "x"), Err(BridgeError::InvalidLane(9)));

        let state = instance.save_state();
        assert_eq!(state.port_names.len(), 8);
        assert_eq!(state.port_names[2], "bass");
    }

    #[test]
    fn test_rejected_rename_keeps_previous_name() {
        let coordinator = coordinator();
        let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::OutputOnly);
        instance.rename_port(0, "left").unwrap();

        coordinator.backend().set_fail_renames(true);
        assert!(instance.rename_port(0, "right").is_err());
        assert_eq!(instance.display_name(0), "left");
        // Unchanged name never reaches the backend
        assert!(instance.rename_port(0, "left").is_ok());
    }

    #[test]
    fn test_restore_falls_back_to_generated_name() {
        let coordinator = coordinator();
        let mut instance = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
        let _other = {
            let mut other = BridgeInstance::new(Arc::clone(&coordinator), Role::Duplex);
            other.rename_port(1, "taken").unwrap();
            other
        };
        instance.rename_port(1, "mine").unwrap();

        let state = InstanceState {
            port_names: vec!["kick".into(), "taken".into(), String::new()],
        };
        assert_eq!(instance.restore_state(&state), 1);
        assert_eq!(instance.display_name(0), "kick");
        assert_eq!(instance.display_name(1), instance.fallback_name(1));
        assert_eq!(instance.display_name(2), instance.fallback_name(2));
    }
}
