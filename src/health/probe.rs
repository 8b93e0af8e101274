//! Resident memory probes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, System};

/// Source of the current resident set size.
pub trait MemoryProbe: Send + Sync {
    /// Resident memory in bytes.
    fn resident_bytes(&self) -> u64;
}

/// Reads the RSS of the running process.
pub struct ProcessProbe {
    system: Mutex<System>,
    pid: Pid,
}

impl ProcessProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: Pid::from(std::process::id() as usize),
        }
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessProbe {
    fn resident_bytes(&self) -> u64 {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        // Only this process is refreshed, never the full process table.
        if !system.refresh_process(self.pid) {
            tracing::warn!(pid = ?self.pid, "Process not found while sampling memory");
            return 0;
        }
        system.process(self.pid).map(|p| p.memory()).unwrap_or(0)
    }
}

/// Probe reporting a value set by the caller.
#[derive(Debug, Default)]
pub struct FixedProbe {
    bytes: AtomicU64,
}

impl FixedProbe {
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: AtomicU64::new(bytes),
        }
    }

    /// Probe reporting `mb` MiB.
    pub fn from_mb(mb: u64) -> Self {
        Self::new(mb * 1024 * 1024)
    }

    pub fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::Relaxed);
    }
}

impl MemoryProbe for FixedProbe {
    fn resident_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
