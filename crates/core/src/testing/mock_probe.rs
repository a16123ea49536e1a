use std::sync::{Mutex, PoisonError};

use crate::admission::{HostSnapshot, LoadSample, ResourceProbe};

/// Fixed host dimensions with a settable load sample.
pub struct MockProbe {
    snapshot: HostSnapshot,
    sample: Mutex<LoadSample>,
}

impl MockProbe {
    pub fn new(cpu_cores: usize, total_memory_gib: f64) -> Self {
        Self {
            snapshot: HostSnapshot {
                cpu_cores,
                total_memory_gib,
            },
            sample: Mutex::new(LoadSample {
                cpu_percent: 50.0,
                memory_percent: 50.0,
            }),
        }
    }

    pub fn set_sample(&self, sample: LoadSample) {
        *self.sample.lock().unwrap_or_else(PoisonError::into_inner) = sample;
    }
}

impl ResourceProbe for MockProbe {
    fn snapshot(&self) -> HostSnapshot {
        self.snapshot
    }

    fn sample(&self) -> LoadSample {
        *self.sample.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
