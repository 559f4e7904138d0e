//! Generated port names
//!
//! When an instance has no explicit name for a port, or a rename is
//! rejected, the port is called `"<hash>:<lane>"`, where `<hash>` is a
//! salted hashids encoding of the instance serial. The same salt, serial and
//! lane always give the same name, and different serials never collide.

use harsh::Harsh;

use crate::error::{BridgeError, BridgeResult};

/// Salted name generator shared by all instances of a coordinator
#[derive(Debug, Clone)]
pub struct PortNamer {
    harsh: Harsh,
}

impl PortNamer {
    pub fn new(salt: &str) -> BridgeResult<Self> {
        let harsh = Harsh::builder()
            .salt(salt)
            .build()
            .map_err(|e| BridgeError::Naming(e.to_string()))?;
        Ok(Self { harsh })
    }

    /// Stable per-instance prefix
    pub fn instance_hash(&self, serial: u64) -> String {
        self.harsh.encode(&[serial])
    }

    /// Fallback name for one lane of an instance
    pub fn fallback_name(&self, serial: u64, lane: usize) -> String {
        format!("{}:{}", self.instance_hash(serial), lane)
    }
}
