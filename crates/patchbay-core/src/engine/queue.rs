//! Hardware-rate frame queues
//!
//! Each of an instance's two hardware-rate buffers is an `rtrb` ring with
//! exactly two users: the instance's processing tick and the hardware
//! callback. Which of them writes depends on the role and the buffer, so
//! each side holds a [`QueueEnd`] that is either the writing or the reading
//! half. Neither side ever waits on the other.
//!
//! ```text
//!                     Playback flow                 Capture flow
//!  processing tick    QueueEnd::Feed  ──frames──►   QueueEnd::Drain
//!  hardware callback  QueueEnd::Drain               QueueEnd::Feed  ──frames──►
//! ```

use rtrb::{Consumer, Producer, RingBuffer};

use crate::types::{Frame, PortDirection, HARDWARE_BUFFER_FRAMES};

/// One half of a hardware-rate queue
pub(crate) enum QueueEnd {
    /// Writing half
    Feed(Producer<Frame>),
    /// Reading half
    Drain(Consumer<Frame>),
}

impl QueueEnd {
    /// Frames currently queued, as seen from this half
    pub fn len(&self) -> usize {
        match self {
            QueueEnd::Feed(producer) => HARDWARE_BUFFER_FRAMES - producer.slots(),
            QueueEnd::Drain(consumer) => consumer.slots(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free slots
    pub fn space(&self) -> usize {
        HARDWARE_BUFFER_FRAMES - self.len()
    }

    /// Append a frame; false when full or when this is the reading half
    #[inline]
    pub fn push(&mut self, frame: Frame) -> bool {
        match self {
            QueueEnd::Feed(producer) => producer.push(frame).is_ok(),
            QueueEnd::Drain(_) => false,
        }
    }

    /// Remove the oldest frame; `None` when empty or when this is the writing half
    #[inline]
    pub fn pop(&mut self) -> Option<Frame> {
        match self {
            QueueEnd::Drain(consumer) => consumer.pop().ok(),
            QueueEnd::Feed(_) => None,
        }
    }

    pub fn producer(&mut self) -> Option<&mut Producer<Frame>> {
        match self {
            QueueEnd::Feed(producer) => Some(producer),
            QueueEnd::Drain(_) => None,
        }
    }

    pub fn consumer(&mut self) -> Option<&mut Consumer<Frame>> {
        match self {
            QueueEnd::Drain(consumer) => Some(consumer),
            QueueEnd::Feed(_) => None,
        }
    }

    /// Discard everything queued (reading half only)
    pub fn clear(&mut self) {
        if let QueueEnd::Drain(consumer) = self {
            let queued = consumer.slots();
            if let Ok(chunk) = consumer.read_chunk(queued) {
                chunk.commit_all();
            }
        }
    }
}

/// An instance's two hardware-rate buffers, as held by one side
///
/// `output` is the primary buffer of every role, `input` the secondary one.
pub(crate) struct HardwareEnds {
    pub output: QueueEnd,
    pub input: QueueEnd,
}

impl HardwareEnds {
    /// Create both queues for the given `[output, input]` flows
    ///
    /// Returns the processing tick's halves and the hardware callback's halves.
    pub fn split(flows: [PortDirection; 2]) -> (Self, Self) {
        let (tick_output, realtime_output) = queue(flows[0]);
        let (tick_input, realtime_input) = queue(flows[1]);
        (
            Self {
                output: tick_output,
                input: tick_input,
            },
            Self {
                output: realtime_output,
                input: realtime_input,
            },
        )
    }

    /// Empty whichever queues this side reads from
    pub fn clear(&mut self) {
        self.output.clear();
        self.input.clear();
    }
}

/// (processing tick half, hardware callback half) of one queue
fn queue(flow: PortDirection) -> (QueueEnd, QueueEnd) {
    let (producer, consumer) = RingBuffer::new(HARDWARE_BUFFER_FRAMES);
    match flow {
        PortDirection::Playback => (QueueEnd::Feed(producer), QueueEnd::Drain(consumer)),
        PortDirection::Capture => (QueueEnd::Drain(consumer), QueueEnd::Feed(producer)),
    }
}
