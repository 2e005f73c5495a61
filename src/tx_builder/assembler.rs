//! Transaction assembly
//!
//! Fetches a block-reference, compiles payer + blockhash + instructions into a
//! v0 message and signs it with both the payer and the mint. The mint must
//! co-sign because its account is created (and must authorize its own
//! allocation) inside the same transaction.
//!
//! Assembly performs no ledger mutation; the only network access is the
//! blockhash lookup in `prepare_execution_context`.

use solana_sdk::{
    message::{v0::Message as MessageV0, VersionedMessage},
    transaction::VersionedTransaction,
};
use std::sync::Arc;
use tracing::debug;

use crate::errors::MintError;
use crate::rpc::LedgerRpc;
use crate::tx_builder::context::ExecutionContext;
use crate::tx_builder::instructions::InstructionSet;
use crate::tx_builder::output::AssembledTransaction;
use crate::wallet::{MintIdentity, PayerIdentity};

/// Compiles and signs launch transactions
pub struct TransactionAssembler {
    rpc: Arc<dyn LedgerRpc>,
}

impl TransactionAssembler {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    /// Fetch a fresh blockhash and its validity ceiling
    pub async fn prepare_execution_context(&self) -> Result<ExecutionContext, MintError> {
        let (blockhash, last_valid_block_height) = self.rpc.latest_blockhash().await?;
        debug!(
            endpoint = %self.rpc.endpoint(),
            blockhash = %blockhash,
            last_valid_block_height = last_valid_block_height,
            "Fetched block-reference"
        );

        Ok(ExecutionContext::new(blockhash, last_valid_block_height))
    }

    /// Fetch a block-reference and assemble a signed transaction
    pub async fn build(
        &self,
        instructions: &InstructionSet,
        payer: &PayerIdentity,
        mint: &MintIdentity,
    ) -> Result<AssembledTransaction, MintError> {
        let context = self.prepare_execution_context().await?;
        assemble_signed(&context, instructions, payer, mint)
    }
}

/// Compile and sign without touching the network
///
/// # Errors
///
/// Returns `MintError::InstructionBuild` if the mint identity does not match
/// the instruction set, or the message cannot be compiled or signed.
pub fn assemble_signed(
    context: &ExecutionContext,
    instructions: &InstructionSet,
    payer: &PayerIdentity,
    mint: &MintIdentity,
) -> Result<AssembledTransaction, MintError> {
    if mint.pubkey() != instructions.mint {
        return Err(MintError::instruction_failed(
            "assembler",
            format!(
                "mint signer {} does not match instruction set mint {}",
                mint.pubkey(),
                instructions.mint
            ),
        ));
    }

    let payer_pubkey = payer.pubkey();
    let message = MessageV0::try_compile(
        &payer_pubkey,
        instructions.instructions(),
        &[],
        context.blockhash,
    )
    .map_err(|e| {
        MintError::instruction_failed("assembler", format!("Failed to compile message: {}", e))
    })?;

    // Signature order follows the message's signer order; both are computed
    // over the same serialized message.
    let tx = VersionedTransaction::try_new(
        VersionedMessage::V0(message),
        &[payer.keypair(), mint.keypair()],
    )
    .map_err(|e| MintError::instruction_failed("assembler", format!("Signing failed: {}", e)))?;

    debug!(
        signature = %tx.signatures[0],
        signatures = tx.signatures.len(),
        blockhash = %context.blockhash,
        "Assembled launch transaction"
    );

    Ok(AssembledTransaction::new(
        tx,
        context.blockhash,
        context.last_valid_block_height,
        instructions.mint,
        instructions.associated_account,
        instructions.metadata_account,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockLedgerRpc;
    use crate::token::{TokenMetadata, TokenSpec};
    use crate::tx_builder::instructions::{plan_mint_instructions, MintInstructionInputs};
    use rust_decimal::Decimal;
    use solana_sdk::hash::Hash;
    use solana_sdk::signature::{Keypair, Signer};

    fn build_set(payer: &PayerIdentity, mint: &MintIdentity) -> InstructionSet {
        let token = TokenSpec::new(9, Decimal::from(1_000_000u64)).unwrap();
        let metadata = TokenMetadata::new("MyToken", "MTK", "https://example.com/mtk.json", 500);
        plan_mint_instructions(MintInstructionInputs {
            token: &token,
            metadata: &metadata,
            payer: payer.pubkey(),
            mint: mint.pubkey(),
            owner: payer.pubkey(),
            rent_lamports: 1_461_600,
        })
        .unwrap()
    }

    #[test]
    fn test_assemble_has_two_valid_signatures() {
        let payer = PayerIdentity::from_keypair(Keypair::new());
        let mint = MintIdentity::generate();
        let set = build_set(&payer, &mint);
        let context = ExecutionContext::new(Hash::new_unique(), 500);

        let assembled = assemble_signed(&context, &set, &payer, &mint).unwrap();

        assert_eq!(assembled.signatures().len(), 2);
        assert_eq!(
            assembled.required_signers(),
            &[payer.pubkey(), mint.pubkey()]
        );
        assert!(assembled.verify_signatures());
        assert_eq!(assembled.last_valid_block_height(), 500);
        assert_eq!(assembled.blockhash(), context.blockhash);
    }

    #[test]
    fn test_signatures_cover_identical_message_bytes() {
        let payer = PayerIdentity::from_keypair(Keypair::new());
        let mint = MintIdentity::generate();
        let set = build_set(&payer, &mint);
        let context = ExecutionContext::new(Hash::new_unique(), 500);

        let assembled = assemble_signed(&context, &set, &payer, &mint).unwrap();
        let bytes = assembled.message_bytes();

        assert!(assembled.signatures()[0].verify(payer.pubkey().as_ref(), &bytes));
        assert!(assembled.signatures()[1].verify(mint.pubkey().as_ref(), &bytes));
    }

    #[test]
    fn test_mismatched_mint_signer_rejected() {
        let payer = PayerIdentity::from_keypair(Keypair::new());
        let mint = MintIdentity::generate();
        let set = build_set(&payer, &mint);
        let context = ExecutionContext::new(Hash::new_unique(), 500);

        let err = assemble_signed(&context, &set, &payer, &MintIdentity::generate()).unwrap_err();
        assert!(matches!(err, MintError::InstructionBuild { .. }));
    }

    #[tokio::test]
    async fn test_build_fetches_fresh_blockhash() {
        let rpc = Arc::new(MockLedgerRpc::new());
        let assembler = TransactionAssembler::new(rpc.clone());
        let payer = PayerIdentity::from_keypair(Keypair::new());
        let mint = MintIdentity::generate();
        let set = build_set(&payer, &mint);

        let first = assembler.build(&set, &payer, &mint).await.unwrap();
        let second = assembler.build(&set, &payer, &mint).await.unwrap();

        assert_ne!(first.blockhash(), second.blockhash());
        assert_ne!(first.signature(), second.signature());
        assert_eq!(rpc.blockhash_requests(), 2);
        assert_eq!(rpc.sent_count(), 0);
    }
}
