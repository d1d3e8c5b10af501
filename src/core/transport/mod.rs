//! Transport layer
//!
//! Connection targets and the raw TCP open/close used by the prober.

mod tcp;

pub use tcp::{close, connect, ConnectError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network address of a device
///
/// Immutable once constructed. The `"host:port"` form doubles as the
/// duplicate-detection key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionTarget {
    host: String,
    port: u16,
}

impl ConnectionTarget {
    /// Create a new target
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Uniqueness key, `"host:port"`
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
