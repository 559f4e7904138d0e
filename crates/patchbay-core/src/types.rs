//! Common types for Patchbay
//!
//! Frames, lane/port layout constants and the module roles shared by the
//! engine and the backends.

/// Audio sample type (32-bit float, same as the hardware backend)
pub type Sample = f32;

/// Logical lanes per direction (4 output lanes, 4 input lanes)
pub const LANES: usize = 4;

/// Hardware ports owned by every instance (output lanes + input lanes)
pub const HARDWARE_PORTS: usize = LANES * 2;

/// Host graph inputs and outputs per instance
pub const HOST_PORTS: usize = LANES * 2;

/// Capacity of the small host-rate ring buffers (frames)
pub const HOST_BUFFER_FRAMES: usize = 16;

/// Capacity of the large hardware-rate ring buffers (frames)
pub const HARDWARE_BUFFER_FRAMES: usize = 1 << 15;

/// One frame of four lanes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub samples: [Sample; LANES],
}

impl Frame {
    /// Create a frame from four lane values
    #[inline]
    pub fn new(samples: [Sample; LANES]) -> Self {
        Self { samples }
    }

    /// Create a silent frame
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Build a frame from host voltages, dividing by `scale`
    #[inline]
    pub fn from_voltages(voltages: &[Sample], scale: Sample) -> Self {
        let mut frame = Self::silence();
        for (sample, &volts) in frame.samples.iter_mut().zip(voltages) {
            *sample = volts / scale;
        }
        frame
    }

    /// Write this frame to host voltages, multiplying by `scale`
    #[inline]
    pub fn to_voltages(&self, voltages: &mut [Sample], scale: Sample) {
        for (volts, &sample) in voltages.iter_mut().zip(&self.samples) {
            *volts = sample * scale;
        }
    }

    /// Linear interpolation between two frames over the first `channels` lanes
    #[inline]
    pub fn lerp(&self, next: &Self, t: Sample, channels: usize) -> Self {
        let mut out = Self::silence();
        for lane in 0..channels.min(LANES) {
            let a = self.samples[lane];
            out.samples[lane] = a + (next.samples[lane] - a) * t;
        }
        out
    }
}

/// Which directions of audio flow a module serves
///
/// Fixed at construction. Every role owns the same 8 hardware ports; the
/// role only decides which of them are real outputs or inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Role {
    /// 4 host inputs to hardware playback, 4 hardware captures to host outputs
    #[default]
    Duplex,
    /// 8 host inputs to 8 hardware playback ports
    OutputOnly,
    /// 8 hardware capture ports to 8 host outputs
    InputOnly,
}

impl Role {
    /// All roles in order
    pub const ALL: [Role; 3] = [Role::Duplex, Role::OutputOnly, Role::InputOnly];

    /// Direction of the hardware port at `lane` (0..8) for this role
    pub fn port_direction(&self, lane: usize) -> PortDirection {
        match self {
            Role::Duplex if lane < LANES => PortDirection::Playback,
            Role::Duplex => PortDirection::Capture,
            Role::OutputOnly => PortDirection::Playback,
            Role::InputOnly => PortDirection::Capture,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Role::Duplex => "duplex",
            Role::OutputOnly => "output-8",
            Role::InputOnly => "input-8",
        }
    }
}

/// Direction of a hardware port, seen from this process
///
/// `Playback` ports are written by us and read by the hardware graph,
/// `Capture` ports are written by the hardware graph and read by us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Playback,
    Capture,
}

/// Host graph port values for one processing tick (voltages)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostPorts {
    pub inputs: [Sample; HOST_PORTS],
    pub outputs: [Sample; HOST_PORTS],
}

impl HostPorts {
    /// Create host ports with the given input voltages and zeroed outputs
    pub fn with_inputs(inputs: [Sample; HOST_PORTS]) -> Self {
        Self {
            inputs,
            outputs: [0.0; HOST_PORTS],
        }
    }
}
