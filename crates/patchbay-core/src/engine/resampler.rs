//! Streaming sample rate conversion between two independently clocked domains
//!
//! Pull-style contract: one call consumes up to `input.len()` frames and
//! produces up to `output.len()` frames, and reports how many of each it
//! actually used. Producing less than requested is normal progress.
//!
//! Uses linear interpolation with the fractional read position carried
//! across calls, so a stream split into arbitrary batches converts the same
//! as one long batch. Equal rates are an exact pass-through.

use rtrb::{Consumer, Producer};

use super::ring_buffer::RingBuffer;
use crate::types::{Frame, LANES};

/// Stateful per-channel resampler for [`Frame`]s
#[derive(Debug, Clone)]
pub struct SampleRateConverter {
    channels: usize,
    input_rate: u32,
    output_rate: u32,
    /// Last consumed input frame (left side of the interpolation)
    prev: Frame,
    /// Position between `prev` and the next input frame; >= 1.0 means
    /// `prev` must be replaced before the next output frame
    frac: f64,
}

impl SampleRateConverter {
    /// Create a converter for the first `channels` lanes (clamped to 4)
    pub fn new(channels: usize) -> Self {
        Self {
            channels: channels.min(LANES),
            input_rate: 1,
            output_rate: 1,
            prev: Frame::silence(),
            frac: 1.0,
        }
    }

    /// Number of lanes converted
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Current (input, output) rates
    pub fn rates(&self) -> (u32, u32) {
        (self.input_rate, self.output_rate)
    }

    /// Set the conversion rates; may be called on every tick
    ///
    /// Zero rates are ignored and the previous rates kept.
    #[inline]
    pub fn set_rates(&mut self, input_rate: u32, output_rate: u32) {
        if input_rate == 0 || output_rate == 0 {
            return;
        }
        self.input_rate = input_rate;
        self.output_rate = output_rate;
    }

    /// Forget interpolation history
    pub fn reset(&mut self) {
        self.prev = Frame::silence();
        self.frac = 1.0;
    }

    /// Convert frames; returns `(consumed, produced)`
    pub fn process(&mut self, input: &[Frame], output: &mut [Frame]) -> (usize, usize) {
        if self.input_rate == self.output_rate {
            return self.pass_through(input, output);
        }

        let step = f64::from(self.input_rate) / f64::from(self.output_rate);
        let mut consumed = 0;
        let mut produced = 0;

        'outer: while produced < output.len() {
            while self.frac >= 1.0 {
                let Some(&frame) = input.get(consumed) else {
                    break 'outer;
                };
                self.prev = frame;
                consumed += 1;
                self.frac -= 1.0;
            }
            let Some(next) = input.get(consumed) else {
                break;
            };
            output[produced] = self.prev.lerp(next, self.frac as f32, self.channels);
            produced += 1;
            self.frac += step;
        }

        (consumed, produced)
    }

    /// Convert a host-rate buffer into a hardware-rate queue
    ///
    /// Moves as much as the converter and the queue's free space allow.
    /// Returns `(consumed, produced)`.
    pub fn feed<const N: usize>(
        &mut self,
        from: &mut RingBuffer<Frame, N>,
        to: &mut Producer<Frame>,
    ) -> (usize, usize) {
        let input = from.readable();
        let wanted = self.max_output(input.len()).min(to.slots());
        let Ok(mut chunk) = to.write_chunk(wanted) else {
            return (0, 0);
        };
        let (first, second) = chunk.as_mut_slices();
        let (mut consumed, mut produced) = self.process(input, first);
        if produced == first.len() {
            let (c, p) = self.process(&input[consumed..], second);
            consumed += c;
            produced += p;
        }
        chunk.commit(produced);
        from.advance_read(consumed);
        (consumed, produced)
    }

    /// Convert a hardware-rate queue into a host-rate buffer
    ///
    /// Returns `(consumed, produced)`.
    pub fn drain<const N: usize>(
        &mut self,
        from: &mut Consumer<Frame>,
        to: &mut RingBuffer<Frame, N>,
    ) -> (usize, usize) {
        let queued = from.slots();
        let Ok(chunk) = from.read_chunk(queued) else {
            return (0, 0);
        };
        let (first, second) = chunk.as_slices();
        let output = to.writable();
        let (mut consumed, mut produced) = self.process(first, output);
        if consumed == first.len() {
            let (c, p) = self.process(second, &mut output[produced..]);
            consumed += c;
            produced += p;
        }
        chunk.commit(consumed);
        to.advance_write(produced);
        (consumed, produced)
    }

    /// Upper bound on frames produced from `input` frames
    fn max_output(&self, input: usize) -> usize {
        if self.input_rate == self.output_rate {
            return input;
        }
        let ratio = f64::from(self.output_rate) / f64::from(self.input_rate);
        (input as f64 * ratio).ceil() as usize + 2
    }

    fn pass_through(&mut self, input: &[Frame], output: &mut [Frame]) -> (usize, usize) {
        let n = input.len().min(output.len());
        for (out, frame) in output[..n].iter_mut().zip(&input[..n]) {
            *out = frame.lerp(frame, 0.0, self.channels);
        }
        if n > 0 {
            // Resume cleanly if the rates diverge later
            self.prev = input[n - 1];
            self.frac = 1.0;
        }
        (n, n)
    }
}
