//! Hardware backend seam
//!
//! The bridge only needs a handful of things from the hardware side: a
//! liveness check, the current rate and period, port lifecycle, and per-period
//! access to port buffers. Everything else about the audio server stays in the
//! concrete backend.

use super::error::BackendResult;
use crate::types::{PortDirection, Sample};

/// Operations the bridge performs against a hardware audio server
pub trait AudioBackend: Send + Sync + 'static {
    /// Handle to one registered port
    type Port: Send + 'static;

    /// False when the server was unreachable at startup or has gone away.
    /// Every instance operation checks this first and becomes a no-op when false.
    fn is_alive(&self) -> bool;

    /// Current hardware sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Current hardware period size in frames
    fn buffer_size(&self) -> usize;

    /// Register a port under `name`
    fn register_port(&self, name: &str, direction: PortDirection) -> BackendResult<Self::Port>;

    /// Rename a port; failure is non-fatal and leaves the old name in place
    fn rename_port(&self, port: &mut Self::Port, name: &str) -> BackendResult<()>;

    /// Release a port
    fn unregister_port(&self, port: Self::Port) -> BackendResult<()>;
}

/// Port buffer access for the duration of one hardware period
///
/// A `None` buffer is a null handle (e.g. mid-rename): writes to it are
/// discarded and reads from it yield silence. Returned slices may be shorter
/// than [`frames`](Self::frames); missing samples are treated the same way.
pub trait PeriodScope<P> {
    /// Frames in this period
    fn frames(&self) -> usize;

    /// Samples captured on `port` this period
    fn capture<'a>(&'a self, port: &'a P) -> Option<&'a [Sample]>;

    /// Buffer to fill for `port` this period
    fn playback<'a>(&'a self, port: &'a mut P) -> Option<&'a mut [Sample]>;
}

/// One resolved hardware lane for the current period
#[derive(Debug, Default)]
pub enum Lane<'a> {
    Playback(&'a mut [Sample]),
    Capture(&'a [Sample]),
    /// No buffer this period
    #[default]
    Missing,
}

impl Lane<'_> {
    /// Captured sample at `frame`, 0.0 when there is nothing to read
    #[inline]
    pub fn read(&self, frame: usize) -> Sample {
        match self {
            Lane::Capture(buf) => buf.get(frame).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Write `sample` at `frame`; discarded when there is nowhere to write
    #[inline]
    pub fn write(&mut self, frame: usize, sample: Sample) {
        if let Lane::Playback(buf) = self {
            if let Some(slot) = buf.get_mut(frame) {
                *slot = sample;
            }
        }
    }

    /// Zero the first `frames` samples of a playback lane
    pub fn fill_silence(&mut self, frames: usize) {
        if let Lane::Playback(buf) = self {
            let n = frames.min(buf.len());
            buf[..n].fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_lane_reads_zero_and_discards_writes() {
        let mut lane = Lane::Missing;
        assert_eq!(lane.read(3), 0.0);
        lane.write(3, 1.0);
        lane.fill_silence(16);
    }

    #[test]
    fn test_short_buffers_are_bounds_checked() {
        let captured = [0.5, 0.25];
        let lane = Lane::Capture(&captured);
        assert_eq!(lane.read(1), 0.25);
        assert_eq!(lane.read(2), 0.0);

        let mut out = [1.0; 2];
        let mut lane = Lane::Playback(&mut out);
        lane.write(1, 0.5);
        lane.write(5, 0.5);
        assert_eq!(lane.read(0), 0.0);
        lane.fill_silence(8);
        assert_eq!(out, [0.0, 0.0]);
    }
}
