//! 8 lanes out
//!
//! Host inputs 0-3 feed the primary ("output") buffers and hardware ports
//! 0-3; host inputs 4-7 borrow the "input" buffers to feed ports 4-7. Both
//! directions of buffering carry playback audio here.

use super::{silence_lanes, write_lanes, RoleRouting, Tick};
use crate::audio::Lane;
use crate::engine::queue::HardwareEnds;
use crate::types::{PortDirection, Role, HARDWARE_PORTS, LANES};

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOnly;

impl RoleRouting for OutputOnly {
    fn role(&self) -> Role {
        Role::OutputOnly
    }

    fn buffer_flows(&self) -> [PortDirection; 2] {
        [PortDirection::Playback, PortDirection::Playback]
    }

    fn process_tick(&self, tick: Tick<'_>) -> bool {
        let (host_rate, hardware_rate) = (tick.host_rate, tick.hardware_rate);
        tick.host.input_converter.set_rates(host_rate, hardware_rate);
        tick.host.output_converter.set_rates(host_rate, hardware_rate);

        let primary = tick.input_frame(0);
        let secondary = tick.input_frame(LANES);
        if !tick.host.output.is_full() {
            tick.host.output.push(primary);
        }
        if !tick.host.input.is_full() {
            tick.host.input.push(secondary);
        }

        // Both halves are pushed together, so the primary buffer paces the drain
        if tick.host.output.is_full() {
            let host = &mut *tick.host;
            let hardware = &mut *tick.hardware;
            if let Some(primary) = hardware.output.producer() {
                host.output_converter.feed(&mut host.output, primary);
            }
            if let Some(secondary) = hardware.input.producer() {
                host.input_converter.feed(&mut host.input, secondary);
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
            let primary = hardware.output.pop().unwrap_or_default();
            let secondary = hardware.input.pop().unwrap_or_default();
            write_lanes(lanes, 0, i, &primary);
            write_lanes(lanes, LANES, i, &secondary);
        }
    }
}
