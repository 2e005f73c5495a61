//! Structured logging for launch pipeline events
//!
//! Every event carries the run's `context_id` so a single launch can be
//! filtered out of interleaved output. Key material never passes through
//! here: events take public keys, signatures and counts only.

use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::network::Network;
use crate::observability::{CorrelationId, TraceContext};

/// Structured logger for pipeline events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context_id: String,
}

impl StructuredLogger {
    pub fn new(correlation_id: &CorrelationId) -> Self {
        Self {
            context_id: correlation_id.to_string(),
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_validated(&self, network: Network, name: &str, symbol: &str, decimals: u8) {
        tracing::info!(
            context_id = %self.context_id,
            network = %network,
            name = %name,
            symbol = %symbol,
            decimals = decimals,
            "Configuration validated"
        );
    }

    pub fn log_instructions_built(&self, mint: &Pubkey, count: usize, raw_amount: u64) {
        tracing::debug!(
            context_id = %self.context_id,
            mint = %mint,
            instruction_count = count,
            raw_amount = raw_amount,
            "Instruction set built"
        );
    }

    pub fn log_balance_checked(&self, payer: &Pubkey, required: u64, available: u64) {
        tracing::debug!(
            context_id = %self.context_id,
            payer = %payer,
            required = required,
            available = available,
            "Payer balance checked"
        );
    }

    /// One event per attempt, tagged with that attempt's span
    pub fn log_assembled(
        &self,
        span: &TraceContext,
        signature: &Signature,
        attempt: u32,
        last_valid_block_height: u64,
    ) {
        tracing::info!(
            context_id = %self.context_id,
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            parent_span_id = ?span.parent_span_id,
            operation = %span.operation,
            signature = %signature,
            attempt = attempt,
            last_valid_block_height = last_valid_block_height,
            "Transaction assembled"
        );
    }

    pub fn log_confirmed(&self, signature: &Signature, slot: u64, fee: Option<u64>, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %signature,
            slot = slot,
            fee = ?fee,
            latency_ms = latency_ms,
            "Transaction confirmed"
        );
    }

    pub fn log_expired(&self, signature: &Signature, last_valid_block_height: u64) {
        tracing::warn!(
            context_id = %self.context_id,
            signature = %signature,
            last_valid_block_height = last_valid_block_height,
            "Transaction expired before landing"
        );
    }

    pub fn log_rebuild(&self, attempt: u32, max_rebuilds: u32) {
        tracing::warn!(
            context_id = %self.context_id,
            attempt = attempt,
            max_rebuilds = max_rebuilds,
            "Rebuilding with fresh block-reference"
        );
    }

    pub fn log_failure(&self, category: &str, error: &str) {
        tracing::error!(
            context_id = %self.context_id,
            category = %category,
            error = %error,
            "Launch failed"
        );
    }
}
