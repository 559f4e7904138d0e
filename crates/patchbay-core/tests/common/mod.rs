//! Shared helpers for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use patchbay_core::audio::MockBackend;
use patchbay_core::{BridgeConfig, Coordinator};

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Coordinator over a live mock backend at 48kHz with the given period size
pub fn coordinator(buffer_size: usize) -> Arc<Coordinator<MockBackend>> {
    init_logging();
    let backend = MockBackend::new()
        .with_sample_rate(48_000)
        .with_buffer_size(buffer_size);
    Coordinator::new(backend, BridgeConfig::default()).unwrap()
}

/// Host inputs tagged per channel: channel `c` carries `c + 1` volts
pub fn tagged_inputs() -> [f32; 8] {
    std::array::from_fn(|c| (c + 1) as f32)
}
