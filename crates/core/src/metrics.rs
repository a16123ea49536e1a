//! Prometheus metrics for the verification pipeline.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry};

pub static VERIFICATION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "veriflow_verification_attempts_total",
            "Verification runs by program and result",
        ),
        &["program", "result"],
    )
    .expect("Failed to create metric")
});

pub static STEP_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "veriflow_step_failures_total",
            "Protocol step failures by step name",
        ),
        &["step"],
    )
    .expect("Failed to create metric")
});

pub static UPLOAD_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "veriflow_upload_failures_total",
        "Document uploads that were refused or aborted",
    )
    .expect("Failed to create metric")
});

pub static POLL_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "veriflow_poll_results_total",
            "Result poller outcomes (code, timeout, error)",
        ),
        &["result"],
    )
    .expect("Failed to create metric")
});

pub static ADMISSION_RETUNES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "veriflow_admission_retunes_total",
            "Admission limit adjustments by direction",
        ),
        &["direction"],
    )
    .expect("Failed to create metric")
});

pub static ADMISSION_LIMITS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "veriflow_admission_limit",
            "Current admission limit per program",
        ),
        &["program"],
    )
    .expect("Failed to create metric")
});

/// Register the statics with the process-wide default registry. Call once at
/// binary startup.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register_metrics(prometheus::default_registry())
}

pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(VERIFICATION_ATTEMPTS.clone()))?;
    registry.register(Box::new(STEP_FAILURES.clone()))?;
    registry.register(Box::new(UPLOAD_FAILURES.clone()))?;
    registry.register(Box::new(POLL_RESULTS.clone()))?;
    registry.register(Box::new(ADMISSION_RETUNES.clone()))?;
    registry.register(Box::new(ADMISSION_LIMITS.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_registers_default_registry() {
        init_metrics().unwrap();
        ADMISSION_RETUNES.with_label_values(&["up"]).inc();
        let names: Vec<String> = prometheus::default_registry()
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"veriflow_admission_retunes_total".to_string()));
    }

    #[test]
    fn test_register_metrics() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();
        VERIFICATION_ATTEMPTS
            .with_label_values(&["k12_teacher", "submitted"])
            .inc();
        assert!(!registry.gather().is_empty());
    }
}
