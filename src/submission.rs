//! Submission and confirmation
//!
//! Sends one signed launch transaction and follows it to a terminal state:
//!
//! ```text
//! Built → Signed → Submitted → Confirmed
//!                            → Expired
//!                            → Rejected
//! ```
//!
//! The engine never resubmits the same signed bytes. Expiry is reported as
//! `MintError::SubmissionExpired` and the caller decides whether to rebuild
//! with a fresh block-reference.

use serde::Serialize;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::errors::MintError;
use crate::metrics::metrics;
use crate::rpc::{LandingStatus, LedgerRpc, TransactionDetails};
use crate::tx_builder::AssembledTransaction;

/// Lifecycle of one launch transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Built,
    Signed,
    Submitted,
    Confirmed,
    Expired,
    Rejected,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Confirmed | TxState::Expired | TxState::Rejected)
    }

    pub fn can_transition_to(&self, next: TxState) -> bool {
        matches!(
            (self, next),
            (TxState::Built, TxState::Signed)
                | (TxState::Signed, TxState::Submitted)
                | (TxState::Signed, TxState::Expired)
                | (TxState::Signed, TxState::Rejected)
                | (TxState::Submitted, TxState::Confirmed)
                | (TxState::Submitted, TxState::Expired)
                | (TxState::Submitted, TxState::Rejected)
        )
    }
}

impl std::fmt::Display for TxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxState::Built => "built",
            TxState::Signed => "signed",
            TxState::Submitted => "submitted",
            TxState::Confirmed => "confirmed",
            TxState::Expired => "expired",
            TxState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Records the states a transaction passed through
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<TxState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            history: vec![TxState::Built],
        }
    }

    pub fn current(&self) -> TxState {
        self.history.last().copied().unwrap_or(TxState::Built)
    }

    /// Move to `next`, refusing transitions the lifecycle does not allow
    pub fn advance(&mut self, next: TxState) -> Result<(), MintError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(MintError::Configuration(format!(
                "illegal transaction state transition {} -> {}",
                current, next
            )));
        }
        debug!(from = %current, to = %next, "Transaction state transition");
        self.history.push(next);
        Ok(())
    }

    pub fn history(&self) -> &[TxState] {
        &self.history
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine tuning, read from the `[submission]` config table
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub poll_interval: Duration,
    /// Consecutive failed polls tolerated before giving up with `Connection`
    pub max_transient_failures: u32,
    /// Attempts to read fee and block time once the transaction has landed
    pub details_attempts: u32,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_transient_failures: 10,
            details_attempts: 10,
        }
    }
}

/// A transaction that reached `Confirmed`
#[derive(Debug, Clone)]
pub struct LandedTransaction {
    pub signature: Signature,
    pub slot: u64,
    pub fee: Option<u64>,
    pub block_time: Option<i64>,
    pub confirmation_latency: Duration,
    pub history: Vec<TxState>,
}

/// Outcome of one status poll
enum PollOutcome {
    Landed { slot: u64 },
    Failed { reason: String },
    Pending,
}

/// Submits signed transactions and tracks them to a terminal state
pub struct SubmissionEngine {
    rpc: Arc<dyn LedgerRpc>,
    config: SubmissionConfig,
}

impl SubmissionEngine {
    pub fn new(rpc: Arc<dyn LedgerRpc>, config: SubmissionConfig) -> Self {
        Self { rpc, config }
    }

    /// Submit once and wait for a terminal state
    ///
    /// # Errors
    ///
    /// - `SubmissionExpired` once the block height passes the ceiling
    /// - `OnChainRejection` with the ledger's reason, verbatim
    /// - `InsufficientFunds` when preflight reports missing lamports
    /// - `Connection` if submission fails at the transport level, or polling
    ///   fails `max_transient_failures` times in a row
    pub async fn submit_and_confirm(
        &self,
        tx: &AssembledTransaction,
    ) -> Result<LandedTransaction, MintError> {
        let mut tracker = StateTracker::new();
        tracker.advance(TxState::Signed)?;

        let signature = tx.signature();
        let ceiling = tx.last_valid_block_height();

        match self.rpc.send_transaction(tx.tx()).await {
            Ok(returned) => {
                if returned != signature {
                    warn!(expected = %signature, returned = %returned, "Node returned unexpected signature");
                }
            }
            Err(e) => {
                let e = attach_signature(e, &signature, ceiling);
                match &e {
                    MintError::SubmissionExpired { .. } => tracker.advance(TxState::Expired)?,
                    MintError::OnChainRejection { .. } => tracker.advance(TxState::Rejected)?,
                    _ => {}
                }
                return Err(e);
            }
        }
        tracker.advance(TxState::Submitted)?;
        metrics().submissions_total.inc();
        info!(signature = %signature, last_valid_block_height = ceiling, "📤 Submitted");

        let started = Instant::now();
        let mut transient_failures: u32 = 0;

        loop {
            let outcome = match self.poll_status(&signature).await {
                Ok(outcome) => {
                    transient_failures = 0;
                    outcome
                }
                Err(e) => {
                    self.note_transient_failure(&mut transient_failures, &signature, e)?;
                    PollOutcome::Pending
                }
            };

            match outcome {
                PollOutcome::Landed { slot } => {
                    return self
                        .finish_confirmed(&mut tracker, signature, slot, started)
                        .await;
                }
                PollOutcome::Failed { reason } => {
                    tracker.advance(TxState::Rejected)?;
                    return Err(MintError::rejected(signature.to_string(), reason));
                }
                PollOutcome::Pending => {}
            }

            match self.rpc.block_height().await {
                Ok(height) if tx.is_expired_at(height) => {
                    // The transaction may have landed between the two lookups
                    match self.poll_status(&signature).await {
                        Ok(PollOutcome::Landed { slot }) => {
                            return self
                                .finish_confirmed(&mut tracker, signature, slot, started)
                                .await;
                        }
                        Ok(PollOutcome::Failed { reason }) => {
                            tracker.advance(TxState::Rejected)?;
                            return Err(MintError::rejected(signature.to_string(), reason));
                        }
                        _ => {
                            tracker.advance(TxState::Expired)?;
                            warn!(
                                signature = %signature,
                                block_height = height,
                                last_valid_block_height = ceiling,
                                "Block-reference expired before landing"
                            );
                            return Err(MintError::SubmissionExpired {
                                signature: signature.to_string(),
                                last_valid_block_height: ceiling,
                            });
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => self.note_transient_failure(&mut transient_failures, &signature, e)?,
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn poll_status(&self, signature: &Signature) -> Result<PollOutcome, MintError> {
        Ok(match self.rpc.signature_status(signature).await? {
            Some(LandingStatus::Landed { slot }) => PollOutcome::Landed { slot },
            Some(LandingStatus::Failed { reason, .. }) => PollOutcome::Failed { reason },
            Some(LandingStatus::Processing { .. }) | None => PollOutcome::Pending,
        })
    }

    /// Count a failed poll; fatal errors and an exhausted budget end the run
    fn note_transient_failure(
        &self,
        failures: &mut u32,
        signature: &Signature,
        err: MintError,
    ) -> Result<(), MintError> {
        if !err.is_retryable() {
            return Err(err);
        }
        *failures += 1;
        warn!(
            signature = %signature,
            attempt = *failures,
            max = self.config.max_transient_failures,
            error = %err,
            "Transient error while confirming"
        );
        if *failures >= self.config.max_transient_failures {
            return Err(MintError::connection(
                self.rpc.endpoint(),
                format!("lost contact while confirming {}: {}", signature, err),
            ));
        }
        Ok(())
    }

    async fn finish_confirmed(
        &self,
        tracker: &mut StateTracker,
        signature: Signature,
        slot: u64,
        started: Instant,
    ) -> Result<LandedTransaction, MintError> {
        tracker.advance(TxState::Confirmed)?;
        let confirmation_latency = started.elapsed();

        let details = self.fetch_details(&signature).await;
        if details.is_none() {
            warn!(signature = %signature, "Transaction details not available");
        }

        Ok(LandedTransaction {
            signature,
            slot: details.map(|d| d.slot).unwrap_or(slot),
            fee: details.map(|d| d.fee),
            block_time: details.and_then(|d| d.block_time),
            confirmation_latency,
            history: tracker.history().to_vec(),
        })
    }

    /// Details lag confirmation on some nodes; a miss here never fails a landed launch
    async fn fetch_details(&self, signature: &Signature) -> Option<TransactionDetails> {
        for attempt in 1..=self.config.details_attempts {
            match self.rpc.transaction_details(signature).await {
                Ok(Some(details)) => return Some(details),
                Ok(None) => debug!(signature = %signature, attempt, "Details not indexed yet"),
                Err(e) => debug!(signature = %signature, attempt, error = %e, "Details lookup failed"),
            }
            if attempt < self.config.details_attempts {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
        None
    }
}

/// Fill in the signature and ceiling that RPC classification cannot know
fn attach_signature(err: MintError, signature: &Signature, ceiling: u64) -> MintError {
    match err {
        MintError::SubmissionExpired { .. } => MintError::SubmissionExpired {
            signature: signature.to_string(),
            last_valid_block_height: ceiling,
        },
        MintError::OnChainRejection {
            signature: s,
            reason,
            logs,
        } if s.is_empty() => MintError::OnChainRejection {
            signature: signature.to_string(),
            reason,
            logs,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{launch_transaction, MockLedgerRpc};

    fn fast_config() -> SubmissionConfig {
        SubmissionConfig {
            poll_interval: Duration::from_millis(1),
            max_transient_failures: 3,
            details_attempts: 3,
        }
    }

    #[test]
    fn test_state_transitions() {
        assert!(TxState::Built.can_transition_to(TxState::Signed));
        assert!(TxState::Submitted.can_transition_to(TxState::Expired));
        assert!(!TxState::Built.can_transition_to(TxState::Submitted));
        assert!(!TxState::Confirmed.can_transition_to(TxState::Submitted));
        assert!(!TxState::Expired.can_transition_to(TxState::Submitted));
        assert!(TxState::Rejected.is_terminal());
        assert!(!TxState::Submitted.is_terminal());
    }

    #[test]
    fn test_tracker_rejects_illegal_transition() {
        let mut tracker = StateTracker::new();
        assert!(tracker.advance(TxState::Confirmed).is_err());
        tracker.advance(TxState::Signed).unwrap();
        tracker.advance(TxState::Submitted).unwrap();
        tracker.advance(TxState::Confirmed).unwrap();
        assert_eq!(
            tracker.history(),
            &[TxState::Built, TxState::Signed, TxState::Submitted, TxState::Confirmed]
        );
    }

    #[tokio::test]
    async fn test_confirmed_with_details() {
        let rpc = Arc::new(MockLedgerRpc::new());
        let tx = launch_transaction(rpc.last_valid_block_height_for_tests());
        let engine = SubmissionEngine::new(rpc.clone(), fast_config());

        let landed = engine.submit_and_confirm(&tx).await.unwrap();

        assert_eq!(landed.signature, tx.signature());
        assert_eq!(landed.fee, Some(10_000));
        assert!(landed.block_time.is_some());
        assert_eq!(landed.history.last(), Some(&TxState::Confirmed));
        assert_eq!(rpc.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_expiry_without_resubmission() {
        let rpc = Arc::new(MockLedgerRpc::new().with_default_status(None));
        rpc.set_block_height(100);
        let tx = launch_transaction(105);
        rpc.script_block_heights(vec![101, 104, 106]);
        let engine = SubmissionEngine::new(rpc.clone(), fast_config());

        let err = engine.submit_and_confirm(&tx).await.unwrap_err();

        match err {
            MintError::SubmissionExpired {
                signature,
                last_valid_block_height,
            } => {
                assert_eq!(signature, tx.signature().to_string());
                assert_eq!(last_valid_block_height, 105);
            }
            other => panic!("Expected SubmissionExpired, got {:?}", other),
        }
        assert_eq!(rpc.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_execution_failure_is_rejection() {
        let rpc = Arc::new(MockLedgerRpc::new().with_default_status(Some(LandingStatus::Failed {
            slot: 7,
            reason: "Error processing Instruction 3: custom program error: 0x1".to_string(),
        })));
        let tx = launch_transaction(rpc.last_valid_block_height_for_tests());
        let engine = SubmissionEngine::new(rpc.clone(), fast_config());

        match engine.submit_and_confirm(&tx).await.unwrap_err() {
            MintError::OnChainRejection { reason, signature, .. } => {
                assert_eq!(reason, "Error processing Instruction 3: custom program error: 0x1");
                assert_eq!(signature, tx.signature().to_string());
            }
            other => panic!("Expected OnChainRejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_poll_errors_tolerated() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.script_statuses(vec![
            Err(MintError::connection("mock", "timeout")),
            Err(MintError::connection("mock", "timeout")),
            Ok(Some(LandingStatus::Processing { slot: 5 })),
            Ok(Some(LandingStatus::Landed { slot: 6 })),
        ]);
        let tx = launch_transaction(rpc.last_valid_block_height_for_tests());
        let engine = SubmissionEngine::new(rpc.clone(), fast_config());

        let landed = engine.submit_and_confirm(&tx).await.unwrap();
        assert_eq!(landed.history.last(), Some(&TxState::Confirmed));
    }

    #[tokio::test]
    async fn test_persistent_poll_errors_become_connection() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.script_statuses(
            (0..10)
                .map(|_| Err(MintError::connection("mock", "connection reset")))
                .collect(),
        );
        let tx = launch_transaction(rpc.last_valid_block_height_for_tests());
        let engine = SubmissionEngine::new(rpc.clone(), fast_config());

        match engine.submit_and_confirm(&tx).await.unwrap_err() {
            MintError::Connection { message, .. } => {
                assert!(message.contains(&tx.signature().to_string()));
            }
            other => panic!("Expected Connection, got {:?}", other),
        }
        assert_eq!(rpc.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_preflight_expiry_gets_signature() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.fail_next_send(MintError::SubmissionExpired {
            signature: String::new(),
            last_valid_block_height: 0,
        });
        let tx = launch_transaction(321);
        let engine = SubmissionEngine::new(rpc.clone(), fast_config());

        match engine.submit_and_confirm(&tx).await.unwrap_err() {
            MintError::SubmissionExpired {
                signature,
                last_valid_block_height,
            } => {
                assert_eq!(signature, tx.signature().to_string());
                assert_eq!(last_valid_block_height, 321);
            }
            other => panic!("Expected SubmissionExpired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_details_still_confirms() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.withhold_details(100);
        let tx = launch_transaction(rpc.last_valid_block_height_for_tests());
        let engine = SubmissionEngine::new(rpc.clone(), fast_config());

        let landed = engine.submit_and_confirm(&tx).await.unwrap();
        assert_eq!(landed.fee, None);
    }
}
