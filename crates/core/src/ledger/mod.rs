//! Accounting seam for verification attempts.
//!
//! Real balance storage lives outside this crate; callers charge a point
//! before a run and refund it exactly once when the run reports
//! `success = false`. The in-memory implementation backs tests and the CLI's
//! local accounting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::protocol::VerificationOutcome;

/// Balance and outcome bookkeeping for verification runs.
#[async_trait]
pub trait SessionLedger: Send + Sync {
    /// Charge `points` from the account. Returns false when the balance is
    /// insufficient; nothing is charged in that case.
    async fn debit(&self, account: &str, points: i64) -> bool;

    /// Return `points` to the account.
    async fn credit(&self, account: &str, points: i64);

    /// Record the final outcome of a run for later inspection.
    async fn record_outcome(&self, account: &str, program_key: &str, outcome: &VerificationOutcome);
}

#[derive(Debug, Clone)]
pub struct LedgerRecord {
    pub account: String,
    pub program_key: String,
    pub success: bool,
    pub message: String,
    pub verification_id: String,
    pub at: DateTime<Utc>,
}

/// In-memory ledger. Accounts start at a configurable balance.
pub struct MemoryLedger {
    starting_balance: i64,
    balances: RwLock<HashMap<String, i64>>,
    records: RwLock<Vec<LedgerRecord>>,
}

impl MemoryLedger {
    pub fn new(starting_balance: i64) -> Self {
        Self {
            starting_balance,
            balances: RwLock::new(HashMap::new()),
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn balance(&self, account: &str) -> i64 {
        *self
            .balances
            .read()
            .await
            .get(account)
            .unwrap_or(&self.starting_balance)
    }

    pub async fn records(&self) -> Vec<LedgerRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl SessionLedger for MemoryLedger {
    async fn debit(&self, account: &str, points: i64) -> bool {
        let mut balances = self.balances.write().await;
        let balance = balances
            .entry(account.to_string())
            .or_insert(self.starting_balance);
        if *balance < points {
            debug!(account, balance = *balance, points, "Debit refused");
            return false;
        }
        *balance -= points;
        true
    }

    async fn credit(&self, account: &str, points: i64) {
        let mut balances = self.balances.write().await;
        let balance = balances
            .entry(account.to_string())
            .or_insert(self.starting_balance);
        *balance += points;
    }

    async fn record_outcome(
        &self,
        account: &str,
        program_key: &str,
        outcome: &VerificationOutcome,
    ) {
        self.records.write().await.push(LedgerRecord {
            account: account.to_string(),
            program_key: program_key.to_string(),
            success: outcome.success,
            message: outcome.message.clone(),
            verification_id: outcome.verification_id.clone(),
            at: Utc::now(),
        });
    }
}
