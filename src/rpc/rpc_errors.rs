use crate::errors::MintError;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_sdk::transaction::TransactionError;

/// Map a `ClientError` onto the launch error taxonomy
///
/// Transport failures are retryable connection errors. A preflight simulation
/// failure is an explicit program failure and keeps the node's message and
/// logs verbatim. Stale blockhashes require a rebuild.
pub fn classify_client_error(err: ClientError, endpoint: &str) -> MintError {
    if let ClientErrorKind::TransactionError(tx_err) = err.kind() {
        return classify_transaction_error(tx_err, "");
    }

    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        message,
        data: RpcResponseErrorData::SendTransactionPreflightFailure(sim),
        ..
    }) = err.kind()
    {
        return classify_preflight_failure(message, sim.logs.clone().unwrap_or_default());
    }

    if matches!(err.kind(), ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_)) {
        return MintError::connection(endpoint, err.to_string());
    }

    let err_str = err.to_string().to_lowercase();

    // Classify based on error message
    if err_str.contains("blockhash not found") {
        MintError::SubmissionExpired {
            signature: String::new(),
            last_valid_block_height: 0,
        }
    } else if is_insufficient_funds(&err_str) {
        MintError::InsufficientFunds {
            required: 0,
            available: 0,
        }
    } else if err_str.contains("timeout")
        || err_str.contains("timed out")
        || err_str.contains("connection")
        || err_str.contains("rate limit")
        || err_str.contains("too many requests")
        || err_str.contains("429")
        || err_str.contains("503")
    {
        MintError::connection(endpoint, err.to_string())
    } else {
        MintError::connection(endpoint, format!("unexpected RPC response: {}", err))
    }
}

/// Map a failed preflight simulation
pub fn classify_preflight_failure(message: &str, logs: Vec<String>) -> MintError {
    let lowered = message.to_lowercase();
    if is_insufficient_funds(&lowered) {
        MintError::InsufficientFunds {
            required: 0,
            available: 0,
        }
    } else if lowered.contains("blockhash not found") {
        MintError::SubmissionExpired {
            signature: String::new(),
            last_valid_block_height: 0,
        }
    } else {
        MintError::OnChainRejection {
            signature: String::new(),
            reason: message.to_string(),
            logs,
        }
    }
}

/// Map an execution failure reported by the ledger
pub fn classify_transaction_error(err: &TransactionError, signature: &str) -> MintError {
    match err {
        TransactionError::InsufficientFundsForFee
        | TransactionError::InsufficientFundsForRent { .. } => MintError::InsufficientFunds {
            required: 0,
            available: 0,
        },
        TransactionError::BlockhashNotFound => MintError::SubmissionExpired {
            signature: signature.to_string(),
            last_valid_block_height: 0,
        },
        other => MintError::rejected(signature, other.to_string()),
    }
}

fn is_insufficient_funds(lowered: &str) -> bool {
    lowered.contains("insufficient funds") || lowered.contains("insufficient lamports")
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::InstructionError;

    #[test]
    fn test_io_error_is_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify_client_error(ClientError::from(io), "http://localhost:8899");
        assert!(matches!(err, MintError::Connection { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_preflight_failure_kept_verbatim() {
        let message = "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x0";
        let logs = vec!["Program 11111111111111111111111111111111 failed".to_string()];
        match classify_preflight_failure(message, logs.clone()) {
            MintError::OnChainRejection { reason, logs: l, .. } => {
                assert_eq!(reason, message);
                assert_eq!(l, logs);
            }
            other => panic!("Expected OnChainRejection, got {:?}", other),
        }
    }

    #[test]
    fn test_preflight_insufficient_lamports() {
        let err = classify_preflight_failure(
            "Transaction simulation failed: Transfer: insufficient lamports 100, need 1461600",
            vec![],
        );
        assert!(matches!(err, MintError::InsufficientFunds { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_preflight_stale_blockhash_requires_rebuild() {
        let err = classify_preflight_failure("Transaction simulation failed: Blockhash not found", vec![]);
        assert!(err.requires_rebuild());
    }

    #[test]
    fn test_transaction_error_mapping() {
        let err = classify_transaction_error(&TransactionError::InsufficientFundsForFee, "sig");
        assert!(matches!(err, MintError::InsufficientFunds { .. }));

        let err = classify_transaction_error(&TransactionError::BlockhashNotFound, "sig");
        assert!(err.requires_rebuild());

        let tx_err = TransactionError::InstructionError(0, InstructionError::Custom(0));
        match classify_transaction_error(&tx_err, "sig") {
            MintError::OnChainRejection { reason, signature, .. } => {
                assert_eq!(reason, tx_err.to_string());
                assert_eq!(signature, "sig");
            }
            other => panic!("Expected OnChainRejection, got {:?}", other),
        }
    }

    #[test]
    fn test_transaction_error_kind_is_classified() {
        let client_err = ClientError::from(ClientErrorKind::TransactionError(
            TransactionError::AccountInUse,
        ));
        assert!(matches!(
            classify_client_error(client_err, "e"),
            MintError::OnChainRejection { .. }
        ));
    }
}
