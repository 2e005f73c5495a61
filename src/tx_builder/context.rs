//! Execution context for transaction assembly
//!
//! Holds the block-reference a transaction is compiled against together with
//! the validity ceiling captured at the same moment. The ceiling travels with
//! the signed transaction so the submission engine can tell when it expired.

use solana_sdk::hash::Hash;

/// Blockhash state needed to build a transaction
///
/// # Lifecycle
///
/// 1. Created from a single `latest_blockhash` RPC call
/// 2. Used to compile exactly one message
/// 3. Discarded; a rebuild always fetches a fresh context
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The blockhash to use for the transaction
    pub blockhash: Hash,

    /// Last block height at which `blockhash` is still accepted
    pub last_valid_block_height: u64,
}

impl ExecutionContext {
    pub fn new(blockhash: Hash, last_valid_block_height: u64) -> Self {
        Self {
            blockhash,
            last_valid_block_height,
        }
    }
}
