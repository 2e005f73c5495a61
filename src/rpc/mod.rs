//! Ledger RPC access
//!
//! `LedgerRpc` is the only seam between the launch pipeline and the network.
//! Every method is a suspension point of the pipeline; everything else the
//! core does is synchronous. `SolanaRpc` implements it over the nonblocking
//! `RpcClient`, tests implement it with scripted mocks.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use std::time::Duration;
use tracing::debug;

use crate::errors::MintError;
use crate::network::NetworkProfile;

pub mod rpc_errors;

pub use rpc_errors::{classify_client_error, classify_preflight_failure, classify_transaction_error};

/// What the ledger currently reports for a submitted signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingStatus {
    /// Seen by the cluster but not yet at the requested commitment
    Processing { slot: u64 },
    /// Landed at (or beyond) the requested commitment
    Landed { slot: u64 },
    /// Landed with an execution error; `reason` is the program-reported text
    Failed { slot: u64, reason: String },
}

/// Post-confirmation transaction details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionDetails {
    pub fee: u64,
    pub block_time: Option<i64>,
    pub slot: u64,
}

impl TransactionDetails {
    /// Details are only known once the node has status metadata with a fee
    pub fn from_meta(fee: Option<u64>, block_time: Option<i64>, slot: u64) -> Option<Self> {
        fee.map(|fee| Self {
            fee,
            block_time,
            slot,
        })
    }
}

/// Ledger operations the launch pipeline depends on
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Endpoint label used in errors and logs
    fn endpoint(&self) -> &str;

    /// Lamports required for an account of `data_len` bytes to be rent exempt
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, MintError>;

    /// Current lamport balance of an account
    async fn balance(&self, pubkey: &Pubkey) -> Result<u64, MintError>;

    /// Latest blockhash together with the last block height it stays valid for
    async fn latest_blockhash(&self) -> Result<(Hash, u64), MintError>;

    /// Current block height
    async fn block_height(&self) -> Result<u64, MintError>;

    /// Submit a signed transaction, returning its signature
    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, MintError>;

    /// Status of a submitted signature, `None` if the cluster has not seen it
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<LandingStatus>, MintError>;

    /// Fee, block time and slot of a landed transaction, `None` if not yet indexed
    async fn transaction_details(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionDetails>, MintError>;
}

/// `LedgerRpc` backed by a Solana JSON-RPC endpoint
pub struct SolanaRpc {
    client: RpcClient,
    endpoint: String,
    commitment: CommitmentConfig,
}

impl SolanaRpc {
    /// Connect to the profile's endpoint at the profile's commitment
    pub fn new(profile: &NetworkProfile, timeout: Duration) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            profile.cluster_endpoint.clone(),
            timeout,
            profile.commitment,
        );
        Self {
            client,
            endpoint: profile.cluster_endpoint.clone(),
            commitment: profile.commitment,
        }
    }

    fn classify(&self, err: solana_client::client_error::ClientError) -> MintError {
        classify_client_error(err, &self.endpoint)
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, MintError> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn balance(&self, pubkey: &Pubkey) -> Result<u64, MintError> {
        self.client
            .get_balance_with_commitment(pubkey, self.commitment)
            .await
            .map(|response| response.value)
            .map_err(|e| self.classify(e))
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64), MintError> {
        self.client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn block_height(&self) -> Result<u64, MintError> {
        self.client
            .get_block_height_with_commitment(self.commitment)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, MintError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<LandingStatus>, MintError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| self.classify(e))?;

        let status = match response.value.into_iter().next().flatten() {
            Some(status) => status,
            None => return Ok(None),
        };

        debug!(
            signature = %signature,
            slot = status.slot,
            confirmation_status = ?status.confirmation_status,
            "Signature status"
        );

        if let Some(err) = &status.err {
            return Ok(Some(LandingStatus::Failed {
                slot: status.slot,
                reason: err.to_string(),
            }));
        }

        if status.satisfies_commitment(self.commitment) {
            Ok(Some(LandingStatus::Landed { slot: status.slot }))
        } else {
            Ok(Some(LandingStatus::Processing { slot: status.slot }))
        }
    }

    async fn transaction_details(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionDetails>, MintError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        match self.client.get_transaction_with_config(signature, config).await {
            Ok(confirmed) => Ok(TransactionDetails::from_meta(
                confirmed.transaction.meta.as_ref().map(|meta| meta.fee),
                confirmed.block_time,
                confirmed.slot,
            )),
            // The node answers `null` until the transaction is indexed
            Err(e) if e.to_string().contains("invalid type: null") => Ok(None),
            Err(e) => Err(self.classify(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_need_status_meta() {
        assert_eq!(TransactionDetails::from_meta(None, Some(1_700_000_000), 42), None);
        assert_eq!(
            TransactionDetails::from_meta(Some(10_000), None, 42),
            Some(TransactionDetails {
                fee: 10_000,
                block_time: None,
                slot: 42,
            })
        );
    }
}
