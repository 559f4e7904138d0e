//! Role variants
//!
//! Each role implements the two halves of the bridge:
//!
//! - **Host tick** (`process_tick`): one host sample in, one host sample out,
//!   moving audio between the host-rate and hardware-rate buffers through
//!   the resamplers and deciding whether the instance is backlogged.
//! - **Hardware period** (`transfer_period`): one block of frames between the
//!   hardware-rate buffers and the hardware port buffers.
//!
//! The variant is picked once when the instance is created.

mod duplex;
mod input_only;
mod output_only;

pub use duplex::Duplex;
pub use input_only::InputOnly;
pub use output_only::OutputOnly;

use super::instance::HostSide;
use super::queue::HardwareEnds;
use crate::audio::Lane;
use crate::types::{Frame, HostPorts, PortDirection, Role, Sample, HARDWARE_PORTS, LANES};

/// Everything one host tick works on
pub(crate) struct Tick<'a> {
    pub host: &'a mut HostSide,
    /// Processing-tick halves of the hardware-rate queues
    pub hardware: &'a mut HardwareEnds,
    pub ports: &'a mut HostPorts,
    /// Host graph sample rate for this tick
    pub host_rate: u32,
    /// Current hardware sample rate
    pub hardware_rate: u32,
    pub voltage_scale: Sample,
    /// Hardware-rate occupancy the backlog check compares against
    pub backlog_threshold: usize,
}

impl Tick<'_> {
    /// Frame built from host inputs `base..base + 4`
    #[inline]
    pub fn input_frame(&self, base: usize) -> Frame {
        Frame::from_voltages(&self.ports.inputs[base..base + LANES], self.voltage_scale)
    }

    /// Deliver `frame` to host outputs `base..base + 4`
    #[inline]
    pub fn emit(&mut self, frame: &Frame, base: usize) {
        frame.to_voltages(&mut self.ports.outputs[base..base + LANES], self.voltage_scale);
    }
}

/// Per-role host tick and hardware period transfer
pub(crate) trait RoleRouting: Send + Sync {
    fn role(&self) -> Role;

    /// Direction audio flows through the `[output, input]` hardware-rate queues
    fn buffer_flows(&self) -> [PortDirection; 2];

    /// Run one host tick; returns true when the instance is backlogged
    fn process_tick(&self, tick: Tick<'_>) -> bool;

    /// Move one hardware period of `frames` frames between the queues and lanes
    ///
    /// `hardware` holds the hardware callback's halves of the queues.
    fn transfer_period(
        &self,
        hardware: &mut HardwareEnds,
        lanes: &mut [Lane<'_>; HARDWARE_PORTS],
        frames: usize,
    );
}

/// Routing implementation for a role
pub(crate) fn routing_for(role: Role) -> &'static dyn RoleRouting {
    match role {
        Role::Duplex => &Duplex,
        Role::OutputOnly => &OutputOnly,
        Role::InputOnly => &InputOnly,
    }
}

/// Read frame `i` from the four lanes starting at `base`
#[inline]
pub(crate) fn read_lanes(lanes: &[Lane<'_>], base: usize, i: usize) -> Frame {
    let mut frame = Frame::silence();
    for (sample, lane) in frame.samples.iter_mut().zip(&lanes[base..base + LANES]) {
        *sample = lane.read(i);
    }
    frame
}

/// Write `frame` at index `i` to the four lanes starting at `base`
#[inline]
pub(crate) fn write_lanes(lanes: &mut [Lane<'_>], base: usize, i: usize, frame: &Frame) {
    for (lane, &sample) in lanes[base..base + LANES].iter_mut().zip(&frame.samples) {
        lane.write(i, sample);
    }
}

/// Silence every playback lane for this period
pub(crate) fn silence_lanes(lanes: &mut [Lane<'_>], frames: usize) {
    for lane in lanes.iter_mut() {
        lane.fill_silence(frames);
    }
}
