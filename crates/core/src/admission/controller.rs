use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::AdmissionConfig;
use crate::metrics;
use crate::program::Program;

use super::{AdmissionGate, AdmissionSlot, ResourceProbe};

struct GateEntry {
    gate: Arc<AdmissionGate>,
    base_share: u32,
}

/// Sizes and retunes per-program concurrency gates.
///
/// Base capacity comes from host dimensions at construction; a periodic
/// retune loop nudges a cumulative multiplier from observed load. Limits are
/// applied to the existing gates in place, so slots held across a retune stay
/// valid.
pub struct AdmissionController {
    probe: Arc<dyn ResourceProbe>,
    config: AdmissionConfig,
    base_limit: u32,
    gates: Mutex<HashMap<String, GateEntry>>,
    multiplier: Mutex<f64>,
    running: AtomicBool,
    shutdown: broadcast::Sender<()>,
}

/// `min(cores * 4, mem_gib * 2)`, clamped to a sane global range.
fn compute_base_limit(cpu_cores: usize, total_memory_gib: f64) -> u32 {
    let by_cpu = (cpu_cores as u32).saturating_mul(4);
    let by_memory = (total_memory_gib * 2.0).floor() as u32;
    by_cpu.min(by_memory).clamp(10, 100)
}

fn scaled_share(base_share: u32, multiplier: f64) -> u32 {
    ((base_share as f64 * multiplier).round() as u32).max(1)
}

impl AdmissionController {
    pub fn new(probe: Arc<dyn ResourceProbe>, config: AdmissionConfig) -> Self {
        let snapshot = probe.snapshot();
        let base_limit = compute_base_limit(snapshot.cpu_cores, snapshot.total_memory_gib);
        info!(
            cpu_cores = snapshot.cpu_cores,
            total_memory_gib = format!("{:.1}", snapshot.total_memory_gib),
            base_limit,
            "Sized admission capacity"
        );

        let known_share = (base_limit / Program::ALL.len() as u32).max(1);
        let (shutdown, _) = broadcast::channel(1);
        let controller = Self {
            probe,
            config,
            base_limit,
            gates: Mutex::new(HashMap::new()),
            multiplier: Mutex::new(1.0),
            running: AtomicBool::new(false),
            shutdown,
        };

        {
            // Startup limits are the plain share; the [min, max] clamp only
            // applies once retuning starts scaling them.
            let mut gates = controller.lock_gates();
            for program in Program::ALL {
                let limit = known_share;
                metrics::ADMISSION_LIMITS
                    .with_label_values(&[program.key()])
                    .set(limit as i64);
                gates.insert(
                    program.key().to_string(),
                    GateEntry {
                        gate: AdmissionGate::new(limit),
                        base_share: known_share,
                    },
                );
            }
        }

        controller
    }

    /// Wait for a slot in the program's gate.
    ///
    /// Unknown program keys get a gate with a conservative share, created on
    /// first use and remembered.
    pub async fn acquire(&self, program_key: &str) -> AdmissionSlot {
        let gate = {
            let mut gates = self.lock_gates();
            let multiplier = self.current_multiplier();
            let entry = gates.entry(program_key.to_string()).or_insert_with(|| {
                let base_share = (self.base_limit / 3).max(1);
                let limit = scaled_share(base_share, multiplier);
                debug!(program = program_key, limit, "Created admission gate");
                metrics::ADMISSION_LIMITS
                    .with_label_values(&[program_key])
                    .set(limit as i64);
                GateEntry {
                    gate: AdmissionGate::new(limit),
                    base_share,
                }
            });
            Arc::clone(&entry.gate)
        };
        gate.acquire().await
    }

    /// Current limits per program, for operator display.
    pub fn limits(&self) -> HashMap<String, u32> {
        self.lock_gates()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.gate.limit()))
            .collect()
    }

    /// Take one load sample and adjust all gates if load crossed a watermark.
    pub fn retune(&self) {
        let sample = self.probe.sample();
        let cfg = &self.config;

        let direction = if sample.cpu_percent > cfg.cpu_high_percent
            || sample.memory_percent > cfg.memory_high_percent
        {
            "down"
        } else if sample.cpu_percent < cfg.cpu_low_percent
            && sample.memory_percent < cfg.memory_low_percent
        {
            "up"
        } else {
            debug!(
                cpu = sample.cpu_percent,
                memory = sample.memory_percent,
                "Load within watermarks, limits unchanged"
            );
            return;
        };

        let multiplier = {
            let mut m = self
                .multiplier
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let scaled = if direction == "down" {
                *m * cfg.scale_down
            } else {
                *m * cfg.scale_up
            };
            *m = scaled.clamp(cfg.multiplier_floor, cfg.multiplier_ceil);
            *m
        };

        let gates = self.lock_gates();
        for (key, entry) in gates.iter() {
            let limit = self.retuned_limit(entry.base_share, multiplier);
            entry.gate.set_limit(limit);
            metrics::ADMISSION_LIMITS
                .with_label_values(&[key])
                .set(limit as i64);
        }
        metrics::ADMISSION_RETUNES
            .with_label_values(&[direction])
            .inc();
        info!(
            cpu = sample.cpu_percent,
            memory = sample.memory_percent,
            multiplier = format!("{multiplier:.2}"),
            direction,
            "Retuned admission limits"
        );
    }

    /// Run `retune` on the configured interval until `stop` is called.
    pub fn spawn_retune_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let controller = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move {
            let interval = Duration::from_secs(controller.config.retune_interval_secs);
            while controller.running.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => controller.retune(),
                    _ = shutdown_rx.recv() => break,
                }
            }
            debug!("Retune loop stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(());
    }

    fn retuned_limit(&self, base_share: u32, multiplier: f64) -> u32 {
        scaled_share(base_share, multiplier).clamp(
            self.config.min_per_program,
            self.config.max_per_program,
        )
    }

    fn current_multiplier(&self) -> f64 {
        *self
            .multiplier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_gates(&self) -> std::sync::MutexGuard<'_, HashMap<String, GateEntry>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProbe;
    use crate::admission::LoadSample;

    fn test_config() -> AdmissionConfig {
        AdmissionConfig::default()
    }

    #[test]
    fn test_base_limit_math() {
        // CPU-bound host.
        assert_eq!(compute_base_limit(4, 64.0), 16);
        // Memory-bound host.
        assert_eq!(compute_base_limit(32, 8.0), 16);
        // Clamped low and high.
        assert_eq!(compute_base_limit(1, 1.0), 10);
        assert_eq!(compute_base_limit(64, 256.0), 100);
    }

    #[tokio::test]
    async fn test_known_programs_get_gates_up_front() {
        let probe = Arc::new(MockProbe::new(8, 32.0));
        let controller = AdmissionController::new(probe, test_config());
        let limits = controller.limits();
        assert_eq!(limits.len(), Program::ALL.len());
        // base 32, five programs, share 6, within [5, 50].
        assert_eq!(limits["k12_teacher"], 6);
    }

    #[tokio::test]
    async fn test_small_host_share_is_not_inflated() {
        // base clamps up to 10, five programs: 2 slots each at startup.
        let probe = Arc::new(MockProbe::new(2, 4.0));
        let controller = AdmissionController::new(probe, test_config());
        assert_eq!(controller.limits()["k12_teacher"], 2);
    }

    #[tokio::test]
    async fn test_unknown_program_gate_is_remembered() {
        let probe = Arc::new(MockProbe::new(8, 32.0));
        let controller = AdmissionController::new(probe, test_config());

        let _slot = controller.acquire("mystery_offer").await;
        let limits = controller.limits();
        // base 32 / 3 = 10.
        assert_eq!(limits["mystery_offer"], 10);
        assert_eq!(limits.len(), Program::ALL.len() + 1);
    }

    #[tokio::test]
    async fn test_retune_scales_down_under_pressure() {
        let probe = Arc::new(MockProbe::new(8, 32.0));
        probe.set_sample(LoadSample {
            cpu_percent: 95.0,
            memory_percent: 50.0,
        });
        let controller = AdmissionController::new(probe, test_config());

        controller.retune();
        // share 6 * 0.7 = 4.2, rounds to 4, clamped up to min 5.
        assert_eq!(controller.limits()["k12_teacher"], 5);
    }

    #[tokio::test]
    async fn test_retune_scales_up_when_idle() {
        let probe = Arc::new(MockProbe::new(8, 32.0));
        probe.set_sample(LoadSample {
            cpu_percent: 10.0,
            memory_percent: 20.0,
        });
        let controller = AdmissionController::new(probe, test_config());

        controller.retune();
        // share 6 * 1.2 = 7.2, rounds to 7.
        assert_eq!(controller.limits()["k12_teacher"], 7);
    }

    #[tokio::test]
    async fn test_multiplier_is_clamped_cumulatively() {
        let probe = Arc::new(MockProbe::new(8, 32.0));
        probe.set_sample(LoadSample {
            cpu_percent: 10.0,
            memory_percent: 20.0,
        });
        let controller = AdmissionController::new(probe, test_config());

        for _ in 0..20 {
            controller.retune();
        }
        // Multiplier caps at 2.0: share 6 * 2.0 = 12.
        assert_eq!(controller.limits()["k12_teacher"], 12);
    }

    #[tokio::test]
    async fn test_retune_within_watermarks_is_a_no_op() {
        let probe = Arc::new(MockProbe::new(8, 32.0));
        probe.set_sample(LoadSample {
            cpu_percent: 60.0,
            memory_percent: 70.0,
        });
        let controller = AdmissionController::new(probe, test_config());

        let before = controller.limits();
        controller.retune();
        assert_eq!(controller.limits(), before);
    }
}
