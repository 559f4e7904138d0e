//! 8 lanes in
//!
//! Hardware capture ports 0-3 arrive through the "output" buffers on host
//! outputs 0-3; ports 4-7 arrive through the "input" buffers on host
//! outputs 4-7.
//!
//! The backlog check is inverted relative to the other roles: the instance
//! reports itself backlogged while the hardware-rate buffer is *below* the
//! threshold, i.e. while it still has headroom.

use super::{read_lanes, RoleRouting, Tick};
use crate::audio::Lane;
use crate::engine::queue::HardwareEnds;
use crate::types::{PortDirection, Role, HARDWARE_PORTS, LANES};

#[derive(Debug, Clone, Copy, Default)]
pub struct InputOnly;

impl RoleRouting for InputOnly {
    fn role(&self) -> Role {
        Role::InputOnly
    }

    fn buffer_flows(&self) -> [PortDirection; 2] {
        [PortDirection::Capture, PortDirection::Capture]
    }

    fn process_tick(&self, mut tick: Tick<'_>) -> bool {
        let (host_rate, hardware_rate) = (tick.host_rate, tick.hardware_rate);
        tick.host.input_converter.set_rates(hardware_rate, host_rate);
        tick.host.output_converter.set_rates(hardware_rate, host_rate);

        if tick.host.output.is_empty() && !tick.hardware.output.is_empty() {
            if let Some(primary) = tick.hardware.output.consumer() {
                let host = &mut *tick.host;
                host.output_converter.drain(primary, &mut host.output);
            }
        }
        if let Some(frame) = tick.host.output.shift() {
            tick.emit(&frame, 0);
        }

        if tick.host.input.is_empty() && !tick.hardware.input.is_empty() {
            if let Some(secondary) = tick.hardware.input.consumer() {
                let host = &mut *tick.host;
                host.input_converter.drain(secondary, &mut host.input);
            }
        }
        if let Some(frame) = tick.host.input.shift() {
            tick.emit(&frame, LANES);
        }

        tick.hardware.output.len() < tick.backlog_threshold
    }

    fn transfer_period(
        &self,
        hardware: &mut HardwareEnds,
        lanes: &mut [Lane<'_>; HARDWARE_PORTS],
        frames: usize,
    ) {
        // Only capture when the whole period fits
        if hardware.output.space() < frames {
            return;
        }
        for i in 0..frames {
            hardware.output.push(read_lanes(lanes, 0, i));
            hardware.input.push(read_lanes(lanes, LANES, i));
        }
    }
}
