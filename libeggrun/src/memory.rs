use std::fmt::{Display, Formatter};

use sysinfo::System;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bytes(pub u64);

impl Bytes {
    /// Decimal gigabytes: bytes / 1e9.
    pub fn gb(&self) -> f64 {
        self.0 as f64 / 1e9
    }

    pub fn gib(&self) -> f64 {
        self.0 as f64 / 2.0_f64.powi(30)
    }
}

/// Total physical memory on the host.
///
/// `Unavailable` never meets a threshold, so a host we can't measure is
/// treated as a small one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostMemory {
    Total(Bytes),
    Unavailable,
}

impl HostMemory {
    /// Sample total memory once.
    pub fn query() -> Self {
        let mut system = System::new();
        system.refresh_memory();

        let memory = Self::from_total_bytes(system.total_memory());
        match memory {
            HostMemory::Total(bytes) => {
                debug!("host memory: {:.1} GB ({:.1} GiB)", bytes.gb(), bytes.gib())
            }
            HostMemory::Unavailable => warn!("couldn't read host memory; assuming it is small"),
        }

        memory
    }

    /// A reading of zero bytes means the platform couldn't report memory.
    pub fn from_total_bytes(total: u64) -> Self {
        match total {
            0 => HostMemory::Unavailable,
            bytes => HostMemory::Total(Bytes(bytes)),
        }
    }

    pub fn from_gb(gb: f64) -> Self {
        Self::from_total_bytes((gb * 1e9).round() as u64)
    }

    pub fn gb(&self) -> Option<f64> {
        match self {
            HostMemory::Total(bytes) => Some(bytes.gb()),
            HostMemory::Unavailable => None,
        }
    }

    pub fn at_least_gb(&self, threshold: f64) -> bool {
        self.gb().is_some_and(|gb| gb >= threshold)
    }
}

impl Display for HostMemory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HostMemory::Total(bytes) => write!(f, "{:.1} GB", bytes.gb()),
            HostMemory::Unavailable => write!(f, "unavailable"),
        }
    }
}
