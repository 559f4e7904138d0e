//! Bridging engine - buffers, resampling, role routing, backpressure
//!
//! - RingBuffer: fixed-capacity frame buffer with contiguous bulk access
//! - Queues: lock-free hardware-rate buffers shared with the hardware callback
//! - SampleRateConverter: streaming resampler between the two clock domains
//! - BacklogLatch: per-instance Clear/Signaled flag
//! - Routing: the Duplex, OutputOnly and InputOnly role variants
//! - BridgeInstance: one module, driven by the host graph one sample at a time
//! - Coordinator: registry, realtime pass and the stall/release protocol

mod coordinator;
mod instance;
mod latch;
mod queue;
mod resampler;
mod ring_buffer;
mod routing;

pub use coordinator::{Backpressure, Coordinator, InstanceHandle, PeriodStatus};
pub use instance::{BridgeInstance, InstanceState, Occupancy};
pub use latch::{BacklogLatch, LatchState};
pub use resampler::SampleRateConverter;
pub use ring_buffer::RingBuffer;
pub use routing::{Duplex, InputOnly, OutputOnly};

use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

/// Lock a mutex, recovering the guard if a panicking thread poisoned it
///
/// Guarded data is plain buffers and port handles, valid in any state.
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock a mutex only if that needs no waiting
///
/// Used by the hardware callback. Poisoned guards are recovered as in [`lock`].
#[inline]
pub(crate) fn try_lock<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}
