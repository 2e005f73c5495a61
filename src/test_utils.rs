//! Test Utilities Module
//!
//! Scripted `LedgerRpc` for deterministic pipeline tests. Nothing here makes
//! network calls.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    rent::Rent,
    signature::{Keypair, Signature},
    transaction::VersionedTransaction,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::errors::MintError;
use crate::rpc::{LandingStatus, LedgerRpc, TransactionDetails};
use crate::token::{TokenMetadata, TokenSpec};
use crate::tx_builder::{
    assemble_signed, plan_mint_instructions, AssembledTransaction, ExecutionContext,
    MintInstructionInputs,
};
use crate::wallet::{MintIdentity, PayerIdentity};

/// Blocks a blockhash stays valid for on the mock ledger
pub const MOCK_VALIDITY_WINDOW: u64 = 150;

/// Fee the mock reports for a landed two-signature transaction
pub const MOCK_FEE: u64 = 10_000;

const MOCK_SLOT: u64 = 42;
const MOCK_BLOCK_TIME: i64 = 1_700_000_000;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock ledger for testing
///
/// Defaults: 10 SOL balance, block height 1000 (static), every submitted
/// signature lands at slot 42 on the first poll, details available at once.
pub struct MockLedgerRpc {
    balance: AtomicU64,
    block_height: AtomicU64,
    scripted_heights: Mutex<VecDeque<u64>>,
    scripted_statuses: Mutex<VecDeque<Result<Option<LandingStatus>, MintError>>>,
    default_status: Mutex<Option<LandingStatus>>,
    send_errors: Mutex<VecDeque<MintError>>,
    sent: Mutex<Vec<Signature>>,
    details_misses: AtomicUsize,
    unreachable: AtomicBool,
    blockhash_requests: AtomicUsize,
    calls: AtomicUsize,
}

impl MockLedgerRpc {
    pub fn new() -> Self {
        Self {
            balance: AtomicU64::new(10_000_000_000),
            block_height: AtomicU64::new(1_000),
            scripted_heights: Mutex::new(VecDeque::new()),
            scripted_statuses: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(Some(LandingStatus::Landed { slot: MOCK_SLOT })),
            send_errors: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            details_misses: AtomicUsize::new(0),
            unreachable: AtomicBool::new(false),
            blockhash_requests: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Status reported once scripted statuses run out (`None` = never seen)
    pub fn with_default_status(self, status: Option<LandingStatus>) -> Self {
        *lock(&self.default_status) = status;
        self
    }

    pub fn with_balance(self, lamports: u64) -> Self {
        self.balance.store(lamports, Ordering::SeqCst);
        self
    }

    pub fn set_block_height(&self, height: u64) {
        self.block_height.store(height, Ordering::SeqCst);
    }

    /// Heights returned by successive `block_height` calls before falling back
    /// to the static height. The last scripted height becomes the new static one.
    pub fn script_block_heights(&self, heights: Vec<u64>) {
        lock(&self.scripted_heights).extend(heights);
    }

    pub fn script_statuses(&self, statuses: Vec<Result<Option<LandingStatus>, MintError>>) {
        lock(&self.scripted_statuses).extend(statuses);
    }

    pub fn fail_next_send(&self, err: MintError) {
        lock(&self.send_errors).push_back(err);
    }

    /// Answer `None` to the next `count` detail lookups
    pub fn withhold_details(&self, count: usize) {
        self.details_misses.store(count, Ordering::SeqCst);
    }

    /// Make every call fail with a connection error
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }

    pub fn sent_signatures(&self) -> Vec<Signature> {
        lock(&self.sent).clone()
    }

    pub fn blockhash_requests(&self) -> usize {
        self.blockhash_requests.load(Ordering::SeqCst)
    }

    /// Total number of ledger calls made
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ceiling `latest_blockhash` would hand out right now
    pub fn last_valid_block_height_for_tests(&self) -> u64 {
        self.block_height.load(Ordering::SeqCst) + MOCK_VALIDITY_WINDOW
    }

    fn enter(&self) -> Result<(), MintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(MintError::connection("mock://ledger", "connection refused"));
        }
        Ok(())
    }
}

impl Default for MockLedgerRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRpc for MockLedgerRpc {
    fn endpoint(&self) -> &str {
        "mock://ledger"
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, MintError> {
        self.enter()?;
        Ok(Rent::default().minimum_balance(data_len))
    }

    async fn balance(&self, _pubkey: &Pubkey) -> Result<u64, MintError> {
        self.enter()?;
        Ok(self.balance.load(Ordering::SeqCst))
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64), MintError> {
        self.enter()?;
        self.blockhash_requests.fetch_add(1, Ordering::SeqCst);
        Ok((Hash::new_unique(), self.last_valid_block_height_for_tests()))
    }

    async fn block_height(&self) -> Result<u64, MintError> {
        self.enter()?;
        if let Some(height) = lock(&self.scripted_heights).pop_front() {
            self.block_height.store(height, Ordering::SeqCst);
        }
        Ok(self.block_height.load(Ordering::SeqCst))
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, MintError> {
        self.enter()?;
        if let Some(err) = lock(&self.send_errors).pop_front() {
            return Err(err);
        }
        let signature = tx.signatures.first().copied().unwrap_or_default();
        lock(&self.sent).push(signature);
        Ok(signature)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<LandingStatus>, MintError> {
        self.enter()?;
        if let Some(scripted) = lock(&self.scripted_statuses).pop_front() {
            return scripted;
        }
        if !lock(&self.sent).contains(signature) {
            return Ok(None);
        }
        Ok(lock(&self.default_status).clone())
    }

    async fn transaction_details(
        &self,
        _signature: &Signature,
    ) -> Result<Option<TransactionDetails>, MintError> {
        self.enter()?;
        let withheld = self
            .details_misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if withheld {
            return Ok(None);
        }
        Ok(Some(TransactionDetails {
            fee: MOCK_FEE,
            block_time: Some(MOCK_BLOCK_TIME),
            slot: MOCK_SLOT,
        }))
    }
}

/// Reference token used across tests: 1,000,000 MTK at 9 decimals, 5% royalty
pub fn sample_token() -> (TokenSpec, TokenMetadata) {
    let token = match TokenSpec::new(9, Decimal::from(1_000_000u64)) {
        Ok(token) => token,
        Err(e) => panic!("sample token must be valid: {}", e),
    };
    let metadata = TokenMetadata::new("MyToken", "MTK", "https://example.com/mtk.png", 500);
    (token, metadata)
}

/// Signed launch transaction with the given validity ceiling
pub fn launch_transaction(last_valid_block_height: u64) -> AssembledTransaction {
    let payer = PayerIdentity::from_keypair(Keypair::new());
    let mint = MintIdentity::generate();
    let (token, metadata) = sample_token();

    let set = match plan_mint_instructions(MintInstructionInputs {
        token: &token,
        metadata: &metadata,
        payer: payer.pubkey(),
        mint: mint.pubkey(),
        owner: payer.pubkey(),
        rent_lamports: Rent::default().minimum_balance(crate::tx_builder::mint_account_len()),
    }) {
        Ok(set) => set,
        Err(e) => panic!("sample instruction set must build: {}", e),
    };

    let context = ExecutionContext::new(Hash::new_unique(), last_valid_block_height);
    match assemble_signed(&context, &set, &payer, &mint) {
        Ok(tx) => tx,
        Err(e) => panic!("sample transaction must assemble: {}", e),
    }
}
