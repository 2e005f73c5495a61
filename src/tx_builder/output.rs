//! Signed launch transaction
//!
//! `AssembledTransaction` is immutable once created: the signatures bind to
//! the exact serialized message bytes, so any change would invalidate them.
//! It also carries the validity ceiling captured at assembly time, which the
//! submission engine uses to detect expiry.

use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction,
};

/// Transaction ready for submission
#[derive(Debug, Clone)]
pub struct AssembledTransaction {
    tx: VersionedTransaction,
    blockhash: Hash,
    last_valid_block_height: u64,
    required_signers: Vec<Pubkey>,
    pub mint: Pubkey,
    pub associated_account: Pubkey,
    pub metadata_account: Pubkey,
}

impl AssembledTransaction {
    /// Wrap a signed transaction
    ///
    /// Required signers are read from the message header.
    pub(crate) fn new(
        tx: VersionedTransaction,
        blockhash: Hash,
        last_valid_block_height: u64,
        mint: Pubkey,
        associated_account: Pubkey,
        metadata_account: Pubkey,
    ) -> Self {
        let required = tx.message.header().num_required_signatures as usize;
        let required_signers = tx
            .message
            .static_account_keys()
            .iter()
            .take(required)
            .copied()
            .collect();

        Self {
            tx,
            blockhash,
            last_valid_block_height,
            required_signers,
            mint,
            associated_account,
            metadata_account,
        }
    }

    pub fn tx(&self) -> &VersionedTransaction {
        &self.tx
    }

    /// Fee payer signature, which identifies the transaction on the ledger
    pub fn signature(&self) -> Signature {
        self.tx.signatures.first().copied().unwrap_or_default()
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.tx.signatures
    }

    pub fn required_signers(&self) -> &[Pubkey] {
        &self.required_signers
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    pub fn last_valid_block_height(&self) -> u64 {
        self.last_valid_block_height
    }

    /// Whether `block_height` is already past the blockhash validity window
    pub fn is_expired_at(&self, block_height: u64) -> bool {
        block_height > self.last_valid_block_height
    }

    /// Serialized message the signatures were computed over
    pub fn message_bytes(&self) -> Vec<u8> {
        self.tx.message.serialize()
    }

    /// Check every signature against the message bytes
    pub fn verify_signatures(&self) -> bool {
        let results = self.tx.verify_with_results();
        !results.is_empty() && results.iter().all(|ok| *ok)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::launch_transaction;

    #[test]
    fn test_expiry_boundary() {
        let tx = launch_transaction(1_000);
        assert!(!tx.is_expired_at(999));
        assert!(!tx.is_expired_at(1_000));
        assert!(tx.is_expired_at(1_001));
    }
}
