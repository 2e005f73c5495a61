//! Launch pipeline
//!
//! Orchestrates one launch run end to end:
//!
//! 1. Generate the mint identity
//! 2. Fetch rent-exempt minimums and build the instruction set
//! 3. Check the payer can cover rent plus fees
//! 4. Assemble with a fresh block-reference, submit, confirm
//! 5. On expiry, rebuild with a new block-reference (same mint) up to
//!    `max_rebuilds` times
//!
//! The instruction set is built once; only the block-reference and the
//! signatures differ between attempts.

use serde_json::json;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::MintError;
use crate::metrics::{metrics, Timer};
use crate::network::NetworkProfile;
use crate::observability::TraceContext;
use crate::rpc::LedgerRpc;
use crate::structured_logging::StructuredLogger;
use crate::submission::{LandedTransaction, SubmissionConfig, SubmissionEngine, TxState};
use crate::tx_builder::{
    mint_account_len, plan_mint_instructions, token_account_len, AssembledTransaction,
    InstructionSet, MintInstructionInputs, TransactionAssembler,
};
use crate::validation::{ConfigSupplier, ValidatedConfig};
use crate::wallet::MintIdentity;

/// Size of a metadata account created by `CreateMetadataAccountV3`
pub const METADATA_ACCOUNT_LEN: usize = 679;

/// Lamports charged per signature
pub const LAMPORTS_PER_SIGNATURE: u64 = 5_000;

/// Signatures on a launch transaction (payer + mint)
const LAUNCH_SIGNATURES: u64 = 2;

/// Pipeline tuning
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub submission: SubmissionConfig,
    /// Rebuild cycles allowed after `SubmissionExpired`
    pub max_rebuilds: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            submission: SubmissionConfig::default(),
            max_rebuilds: 1,
        }
    }
}

/// Rent-exempt minimums for the accounts a launch creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchCosts {
    pub mint_rent: u64,
    pub token_account_rent: u64,
    pub metadata_rent: u64,
    pub fee_allowance: u64,
}

impl LaunchCosts {
    pub async fn fetch(rpc: &dyn LedgerRpc) -> Result<Self, MintError> {
        Ok(Self {
            mint_rent: rpc.minimum_balance_for_rent_exemption(mint_account_len()).await?,
            token_account_rent: rpc
                .minimum_balance_for_rent_exemption(token_account_len())
                .await?,
            metadata_rent: rpc
                .minimum_balance_for_rent_exemption(METADATA_ACCOUNT_LEN)
                .await?,
            fee_allowance: LAMPORTS_PER_SIGNATURE * LAUNCH_SIGNATURES,
        })
    }

    /// Lamports the payer must hold before submitting
    pub fn total_required(&self) -> u64 {
        self.mint_rent
            .saturating_add(self.token_account_rent)
            .saturating_add(self.metadata_rent)
            .saturating_add(self.fee_allowance)
    }
}

/// Terminal result of a launch run
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub mint_address: Pubkey,
    pub associated_account_address: Pubkey,
    pub metadata_address: Pubkey,
    pub signature: Signature,
    pub terminal_status: TxState,
    pub fee: Option<u64>,
    pub block_time: Option<i64>,
    pub slot: u64,
    /// Submission attempts, including the first
    pub attempts: u32,
}

impl SubmissionResult {
    fn confirmed(tx: &AssembledTransaction, landed: &LandedTransaction, attempts: u32) -> Self {
        Self {
            mint_address: tx.mint,
            associated_account_address: tx.associated_account,
            metadata_address: tx.metadata_account,
            signature: landed.signature,
            terminal_status: TxState::Confirmed,
            fee: landed.fee,
            block_time: landed.block_time,
            slot: landed.slot,
            attempts,
        }
    }

    /// JSON rendering with explorer links for `profile`
    pub fn to_json(&self, profile: &NetworkProfile) -> serde_json::Value {
        json!({
            "network": profile.network.to_string(),
            "mint_address": self.mint_address.to_string(),
            "associated_account_address": self.associated_account_address.to_string(),
            "metadata_address": self.metadata_address.to_string(),
            "signature": self.signature.to_string(),
            "status": self.terminal_status,
            "fee_lamports": self.fee,
            "block_time": self.block_time,
            "slot": self.slot,
            "attempts": self.attempts,
            "explorer": {
                "transaction": profile.explorer_tx_url(&self.signature),
                "mint": profile.explorer_address_url(&self.mint_address),
            },
        })
    }
}

/// Runs launches against one ledger connection
pub struct MintPipeline {
    rpc: Arc<dyn LedgerRpc>,
    assembler: TransactionAssembler,
    engine: SubmissionEngine,
    max_rebuilds: u32,
}

impl MintPipeline {
    pub fn new(rpc: Arc<dyn LedgerRpc>, settings: PipelineSettings) -> Self {
        Self {
            assembler: TransactionAssembler::new(rpc.clone()),
            engine: SubmissionEngine::new(rpc.clone(), settings.submission),
            max_rebuilds: settings.max_rebuilds,
            rpc,
        }
    }

    /// Validate first, then run
    ///
    /// A configuration that fails validation never reaches the network.
    pub async fn launch(
        &self,
        supplier: &impl ConfigSupplier,
    ) -> Result<SubmissionResult, MintError> {
        let config = supplier.supply_config()?;
        self.run(&config).await
    }

    /// Run one launch with an already validated configuration
    pub async fn run(&self, config: &ValidatedConfig) -> Result<SubmissionResult, MintError> {
        metrics().runs_total.inc();
        let trace = TraceContext::new("launch");
        let logger = StructuredLogger::new(trace.correlation_id());

        logger.log_validated(
            config.profile.network,
            &config.metadata.name,
            &config.metadata.symbol,
            config.token.decimals(),
        );

        let result = self.execute(config, &trace, &logger).await;
        if let Err(e) = &result {
            metrics().record_failure(e);
            logger.log_failure(e.category(), &e.to_string());
        }
        result
    }

    async fn execute(
        &self,
        config: &ValidatedConfig,
        trace: &TraceContext,
        logger: &StructuredLogger,
    ) -> Result<SubmissionResult, MintError> {
        let payer = &config.payer;
        let mint = MintIdentity::generate();

        let costs = LaunchCosts::fetch(self.rpc.as_ref()).await?;
        let instructions = self.build_instructions(config, &mint, costs.mint_rent)?;
        logger.log_instructions_built(&mint.pubkey(), instructions.len(), config.token.raw_amount());

        let available = self.rpc.balance(&payer.pubkey()).await?;
        let required = costs.total_required();
        logger.log_balance_checked(&payer.pubkey(), required, available);
        if available < required {
            return Err(MintError::InsufficientFunds {
                required,
                available,
            });
        }

        let mut attempt: u32 = 1;
        loop {
            let span = trace.child_span(if attempt == 1 { "submit" } else { "rebuild" });
            let assembled = self.assembler.build(&instructions, payer, &mint).await?;
            logger.log_assembled(
                &span,
                &assembled.signature(),
                attempt,
                assembled.last_valid_block_height(),
            );

            match self.engine.submit_and_confirm(&assembled).await {
                Ok(landed) => {
                    metrics().confirmed_total.inc();
                    metrics()
                        .confirmation_latency
                        .observe(landed.confirmation_latency.as_secs_f64());
                    logger.log_confirmed(
                        &landed.signature,
                        landed.slot,
                        landed.fee,
                        landed.confirmation_latency.as_millis() as u64,
                    );
                    info!(mint = %assembled.mint, attempts = attempt, "✅ Token launched");
                    return Ok(SubmissionResult::confirmed(&assembled, &landed, attempt));
                }
                Err(e) if e.requires_rebuild() => {
                    logger.log_expired(&assembled.signature(), assembled.last_valid_block_height());
                    if attempt > self.max_rebuilds {
                        return Err(e);
                    }
                    metrics().expired_total.inc();
                    metrics().rebuilds_total.inc();
                    logger.log_rebuild(attempt, self.max_rebuilds);
                    attempt += 1;
                }
                Err(e) => {
                    warn!(signature = %assembled.signature(), category = e.category(), "Submission failed");
                    return Err(e);
                }
            }
        }
    }

    fn build_instructions(
        &self,
        config: &ValidatedConfig,
        mint: &MintIdentity,
        rent_lamports: u64,
    ) -> Result<InstructionSet, MintError> {
        let timer = Timer::new();
        let set = plan_mint_instructions(MintInstructionInputs {
            token: &config.token,
            metadata: &config.metadata,
            payer: config.payer.pubkey(),
            mint: mint.pubkey(),
            owner: config.payer.pubkey(),
            rent_lamports,
        })?;
        timer.observe_duration(&metrics().build_latency);
        Ok(set)
    }
}
