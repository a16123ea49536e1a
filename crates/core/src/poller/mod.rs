//! Bounded polling for the reward code after document review.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::protocol::VerificationClient;

/// Polls a session's status until it reaches a terminal state.
pub struct ResultPoller {
    client: Arc<VerificationClient>,
    interval: Duration,
}

impl ResultPoller {
    pub fn new(client: Arc<VerificationClient>, interval: Duration) -> Self {
        Self { client, interval }
    }

    /// Poll until the session yields a reward code, fails, or the deadline
    /// passes.
    ///
    /// The first query happens immediately; a code already present costs zero
    /// sleeps. `deadline = None` polls indefinitely, which is what manual
    /// lookups want. Returns `None` on terminal error or deadline; re-invoking
    /// later with the same id is safe because the remote keeps the session
    /// state.
    pub async fn poll_for_code(
        &self,
        verification_id: &str,
        deadline: Option<Duration>,
    ) -> Option<String> {
        let started = Instant::now();

        loop {
            match self.client.fetch_status(verification_id).await {
                Ok(status) => {
                    if status.current_step == "success" {
                        if let Some(code) = status.reward_code {
                            info!(verification_id, "Reward code available");
                            metrics::POLL_RESULTS.with_label_values(&["code"]).inc();
                            return Some(code);
                        }
                        // Success without a code yet; keep polling.
                        debug!(verification_id, "Session succeeded, code not issued yet");
                    } else if status.current_step == "error" {
                        info!(verification_id, "Session reached error state");
                        metrics::POLL_RESULTS.with_label_values(&["error"]).inc();
                        return None;
                    } else {
                        debug!(
                            verification_id,
                            current_step = %status.current_step,
                            "Session still under review"
                        );
                    }
                }
                Err(e) => {
                    // Transient transport trouble is not a verdict.
                    warn!(verification_id, error = %e, "Status query failed, will retry");
                }
            }

            if let Some(max_wait) = deadline {
                if started.elapsed() >= max_wait {
                    info!(verification_id, "Gave up waiting for reward code");
                    metrics::POLL_RESULTS.with_label_values(&["timeout"]).inc();
                    return None;
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}
