use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use veriflow_core::admission::{AdmissionController, LoadSample};
use veriflow_core::config::AdmissionConfig;
use veriflow_core::testing::MockProbe;

// 8 cores / 32 GiB: base 32, five known programs, 6 slots each.
fn controller() -> (Arc<MockProbe>, Arc<AdmissionController>) {
    let probe = Arc::new(MockProbe::new(8, 32.0));
    let controller = Arc::new(AdmissionController::new(
        probe.clone(),
        AdmissionConfig::default(),
    ));
    (probe, controller)
}

#[tokio::test]
async fn test_concurrent_holders_never_exceed_limit() {
    let (_probe, controller) = controller();
    let limit = controller.limits()["k12_teacher"] as usize;

    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..limit * 5 {
        let controller = Arc::clone(&controller);
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        handles.push(tokio::spawn(async move {
            let slot = controller.acquire("k12_teacher").await;
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            drop(slot);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let max = max_seen.load(Ordering::SeqCst);
    assert!(max <= limit, "{max} holders exceeded limit {limit}");
    assert!(max > 1, "admission never ran anything concurrently");
}

#[tokio::test]
async fn test_programs_do_not_share_slots() {
    let (_probe, controller) = controller();
    let limit = controller.limits()["k12_teacher"];

    // Saturate one program.
    let mut held = Vec::new();
    for _ in 0..limit {
        held.push(controller.acquire("k12_teacher").await);
    }

    // Another program still admits immediately.
    let other = tokio::time::timeout(
        Duration::from_millis(100),
        controller.acquire("student_music"),
    )
    .await;
    assert!(other.is_ok());

    // The saturated program does not.
    let same = tokio::time::timeout(
        Duration::from_millis(100),
        controller.acquire("k12_teacher"),
    )
    .await;
    assert!(same.is_err());
}

#[tokio::test]
async fn test_retune_shrink_honors_outstanding_holders() {
    let (probe, controller) = controller();
    let limit = controller.limits()["k12_teacher"];

    let mut held = Vec::new();
    for _ in 0..limit {
        held.push(controller.acquire("k12_teacher").await);
    }

    probe.set_sample(LoadSample {
        cpu_percent: 95.0,
        memory_percent: 90.0,
    });
    controller.retune();
    let shrunk = controller.limits()["k12_teacher"];
    assert!(shrunk < limit);

    // Holders stay valid; new acquires block until enough release.
    let blocked = tokio::time::timeout(
        Duration::from_millis(100),
        controller.acquire("k12_teacher"),
    )
    .await;
    assert!(blocked.is_err());

    held.clear();
    let admitted = tokio::time::timeout(
        Duration::from_millis(100),
        controller.acquire("k12_teacher"),
    )
    .await;
    assert!(admitted.is_ok());
}

#[tokio::test]
async fn test_retune_loop_applies_limits() {
    let probe = Arc::new(MockProbe::new(8, 32.0));
    probe.set_sample(LoadSample {
        cpu_percent: 10.0,
        memory_percent: 20.0,
    });
    let config = AdmissionConfig {
        retune_interval_secs: 1,
        ..AdmissionConfig::default()
    };
    let controller = Arc::new(AdmissionController::new(probe, config));
    let before = controller.limits()["k12_teacher"];

    let handle = controller.spawn_retune_loop();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    controller.stop();
    handle.await.unwrap();

    assert!(controller.limits()["k12_teacher"] > before);
}
