//! 4 lanes out, 4 lanes in
//!
//! Host inputs 0-3 go to hardware playback ports 0-3. Hardware capture ports
//! 4-7 come back on host outputs 0-3.

use super::{read_lanes, silence_lanes, write_lanes, RoleRouting, Tick};
use crate::audio::Lane;
use crate::engine::queue::HardwareEnds;
use crate::types::{PortDirection, Role, HARDWARE_PORTS, LANES};

#[derive(Debug, Clone, Copy, Default)]
pub struct Duplex;

impl RoleRouting for Duplex {
    fn role(&self) -> Role {
        Role::Duplex
    }

    fn buffer_flows(&self) -> [PortDirection; 2] {
        [PortDirection::Playback, PortDirection::Capture]
    }

    fn process_tick(&self, mut tick: Tick<'_>) -> bool {
        let (host_rate, hardware_rate) = (tick.host_rate, tick.hardware_rate);
        tick.host.input_converter.set_rates(hardware_rate, host_rate);
        tick.host.output_converter.set_rates(host_rate, hardware_rate);

        // Hardware capture toward the host
        if tick.host.input.is_empty() && !tick.hardware.input.is_empty() {
            if let Some(capture) = tick.hardware.input.consumer() {
                let host = &mut *tick.host;
                host.input_converter.drain(capture, &mut host.input);
            }
        }
        if let Some(frame) = tick.host.input.shift() {
            tick.emit(&frame, 0);
        }

        // Host inputs toward hardware playback
        let frame = tick.input_frame(0);
        if !tick.host.output.is_full() {
            tick.host.output.push(frame);
        }
        if tick.host.output.is_full() {
            if let Some(playback) = tick.hardware.output.producer() {
                let host = &mut *tick.host;
                host.output_converter.feed(&mut host.output, playback);
            }
        }

        tick.hardware.output.len() > tick.backlog_threshold
    }

    fn transfer_period(
        &self,
        hardware: &mut HardwareEnds,
        lanes: &mut [Lane<'_>; HARDWARE_PORTS],
        frames: usize,
    ) {
        if hardware.output.len() < frames {
            silence_lanes(lanes, frames);
            return;
        }
        for i in 0..frames {
            if let Some(frame) = hardware.output.pop() {
                write_lanes(lanes, 0, i, &frame);
            }
            hardware.input.push(read_lanes(lanes, LANES, i));
        }
    }
}
