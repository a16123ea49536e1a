use std::sync::{Mutex, PoisonError};
use sysinfo::System;

/// Static host dimensions, read once at startup.
#[derive(Debug, Clone, Copy)]
pub struct HostSnapshot {
    pub cpu_cores: usize,
    pub total_memory_gib: f64,
}

/// A point-in-time load reading.
#[derive(Debug, Clone, Copy)]
pub struct LoadSample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

/// Source of host resource readings for admission sizing.
pub trait ResourceProbe: Send + Sync {
    fn snapshot(&self) -> HostSnapshot;
    fn sample(&self) -> LoadSample;
}

/// Reads the actual host via sysinfo.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn snapshot(&self) -> HostSnapshot {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        system.refresh_cpu_usage();
        HostSnapshot {
            cpu_cores: system.cpus().len().max(1),
            total_memory_gib: system.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0),
        }
    }

    fn sample(&self) -> LoadSample {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        // CPU usage is computed against the previous refresh; the very first
        // sample after startup can read low.
        system.refresh_cpu_usage();
        let total = system.total_memory().max(1);
        LoadSample {
            cpu_percent: system.global_cpu_usage(),
            memory_percent: (system.used_memory() as f64 / total as f64 * 100.0) as f32,
        }
    }
}
