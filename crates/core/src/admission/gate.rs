use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

struct GateState {
    limit: u32,
    in_use: u32,
}

/// A counting gate whose capacity can be adjusted in place.
///
/// The limit is a soft target: shrinking below the number of outstanding
/// slots never revokes them, it only blocks new acquisitions until enough
/// holders release. Slots are tied to the gate itself, so resizing can never
/// orphan a release.
pub struct AdmissionGate {
    state: Mutex<GateState>,
    notify: Notify,
}

impl AdmissionGate {
    pub fn new(limit: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GateState { limit, in_use: 0 }),
            notify: Notify::new(),
        })
    }

    /// Wait until a slot is free and take it.
    pub async fn acquire(self: Arc<Self>) -> AdmissionSlot {
        loop {
            // Register for notification before checking, so a release between
            // the check and the await is not missed.
            let notified = self.notify.notified();
            let admitted = {
                let mut state = self.lock_state();
                if state.in_use < state.limit {
                    state.in_use += 1;
                    Some(state.in_use < state.limit)
                } else {
                    None
                }
            };
            if let Some(capacity_remains) = admitted {
                // Chain the wakeup: a grow by N stores a single permit, so
                // each admitted waiter passes it on while capacity remains.
                if capacity_remains {
                    self.notify.notify_one();
                }
                drop(notified);
                return AdmissionSlot { gate: self };
            }
            notified.await;
        }
    }

    /// Adjust capacity in place. Raising the limit wakes blocked acquirers.
    pub fn set_limit(&self, limit: u32) {
        let grew = {
            let mut state = self.lock_state();
            let grew = limit > state.limit;
            state.limit = limit;
            grew
        };
        if grew {
            self.notify.notify_waiters();
            self.notify.notify_one();
        }
    }

    pub fn limit(&self) -> u32 {
        self.lock_state().limit
    }

    pub fn in_use(&self) -> u32 {
        self.lock_state().in_use
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) {
        {
            let mut state = self.lock_state();
            state.in_use = state.in_use.saturating_sub(1);
        }
        self.notify.notify_one();
    }
}

/// An occupied slot; releases back to its gate on drop.
pub struct AdmissionSlot {
    gate: Arc<AdmissionGate>,
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_up_to_limit() {
        let gate = AdmissionGate::new(2);
        let a = gate.clone().acquire().await;
        let _b = gate.clone().acquire().await;
        assert_eq!(gate.in_use(), 2);

        // Third acquire must block until a slot frees up.
        let pending =
            tokio::time::timeout(Duration::from_millis(50), gate.clone().acquire()).await;
        assert!(pending.is_err());

        drop(a);
        let _c = tokio::time::timeout(Duration::from_millis(50), gate.clone().acquire())
            .await
            .unwrap();
        assert_eq!(gate.in_use(), 2);
    }

    #[tokio::test]
    async fn test_raise_limit_wakes_waiters() {
        let gate = AdmissionGate::new(1);
        let _a = gate.clone().acquire().await;

        let waiter = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.acquire().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        gate.set_limit(2);
        let _b = tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(gate.in_use(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_grow_admits_all_eligible_waiters() {
        let gate = AdmissionGate::new(1);
        let _a = gate.clone().acquire().await;

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let gate = Arc::clone(&gate);
            waiters.push(tokio::spawn(async move { gate.acquire().await }));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        gate.set_limit(4);
        // Every waiter must get in, not just the one holding the stored permit.
        let mut slots = Vec::new();
        for waiter in waiters {
            slots.push(
                tokio::time::timeout(Duration::from_millis(200), waiter)
                    .await
                    .unwrap()
                    .unwrap(),
            );
        }
        assert_eq!(gate.in_use(), 4);
    }

    #[tokio::test]
    async fn test_shrink_honors_existing_holders() {
        let gate = AdmissionGate::new(3);
        let a = gate.clone().acquire().await;
        let b = gate.clone().acquire().await;
        let c = gate.clone().acquire().await;

        gate.set_limit(1);
        assert_eq!(gate.in_use(), 3);

        // Releases below the new limit are required before anyone gets in.
        drop(a);
        drop(b);
        let pending =
            tokio::time::timeout(Duration::from_millis(50), gate.clone().acquire()).await;
        assert!(pending.is_err());

        drop(c);
        let _d = tokio::time::timeout(Duration::from_millis(100), gate.clone().acquire())
            .await
            .unwrap();
        assert_eq!(gate.in_use(), 1);
    }
}
