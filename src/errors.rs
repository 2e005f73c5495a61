//! Error taxonomy for the token launch pipeline
//!
//! Every failure the core can produce is one of these variants. Each variant
//! is classified as either retryable or fatal so the caller never has to
//! string-match to decide what to do next:
//! - Connection: transient, the same step may be retried
//! - SubmissionExpired: retryable only by rebuilding with a fresh blockhash
//! - everything else: fatal, surfaced to the top-level caller

use crate::validation::ValidationReport;
use thiserror::Error;

/// Comprehensive error type for all token launch operations
#[derive(Error, Debug, Clone)]
pub enum MintError {
    /// One or more input fields failed pre-flight validation
    ///
    /// Never produced after a network call has been made.
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// RPC endpoint unreachable or the request timed out
    #[error("Connection error (endpoint: {endpoint}): {message}")]
    Connection {
        /// The RPC endpoint that failed
        endpoint: String,
        /// Transport-level failure description
        message: String,
    },

    /// Secret key text is malformed or decodes to the wrong length
    #[error("Invalid secret key: {0}")]
    KeyFormat(String),

    /// Payer cannot cover rent plus fees
    #[error("Insufficient funds: required {required} lamports, available {available}")]
    InsufficientFunds {
        /// Lamports needed for rent-exempt balances and fees
        required: u64,
        /// Lamports currently held by the payer (0 if unknown)
        available: u64,
    },

    /// Address derivation or instruction payload could not be produced
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild {
        /// Program the instruction targets
        program: String,
        /// Detailed reason for the failure
        reason: String,
    },

    /// The blockhash validity ceiling passed before the transaction landed
    #[error("Transaction {signature} expired: block height exceeded {last_valid_block_height}")]
    SubmissionExpired {
        /// Signature of the expired transaction (empty if never submitted)
        signature: String,
        /// Ledger height beyond which the blockhash was rejected
        last_valid_block_height: u64,
    },

    /// The ledger reported an explicit execution failure
    #[error("Transaction {signature} rejected: {reason}")]
    OnChainRejection {
        /// Signature of the rejected transaction
        signature: String,
        /// Program-reported reason, verbatim
        reason: String,
        /// Program logs, when the node returned them
        logs: Vec<String>,
    },

    /// Invalid runtime configuration (unknown network, bad config file)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MintError {
    /// Check if the failed step can be retried as-is
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::SubmissionExpired { .. } => true,

            Self::Validation(_) => false,
            Self::KeyFormat(_) => false,
            Self::InsufficientFunds { .. } => false,
            Self::InstructionBuild { .. } => false,
            Self::OnChainRejection { .. } => false,
            Self::Configuration(_) => false,
        }
    }

    /// Check if recovery requires assembling a fresh transaction
    ///
    /// An expired transaction must never be resubmitted with the same bytes.
    pub fn requires_rebuild(&self) -> bool {
        matches!(self, Self::SubmissionExpired { .. })
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Connection { .. } => "connection",
            Self::KeyFormat(_) => "key_format",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InstructionBuild { .. } => "instruction",
            Self::SubmissionExpired { .. } => "expired",
            Self::OnChainRejection { .. } => "rejected",
            Self::Configuration(_) => "config",
        }
    }
}

// Convenience constructors for common error scenarios
impl MintError {
    /// Create a connection error for an endpoint
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create an instruction build error for a specific program
    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Create an on-chain rejection without logs
    pub fn rejected(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OnChainRejection {
            signature: signature.into(),
            reason: reason.into(),
            logs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MintError::connection("https://api.devnet.solana.com", "connection refused");
        assert_eq!(
            err.to_string(),
            "Connection error (endpoint: https://api.devnet.solana.com): connection refused"
        );

        let err = MintError::InsufficientFunds {
            required: 10,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required 10 lamports, available 3"
        );
    }

    #[test]
    fn test_error_retryability() {
        assert!(MintError::connection("e", "m").is_retryable());
        assert!(MintError::SubmissionExpired {
            signature: "sig".to_string(),
            last_valid_block_height: 100,
        }
        .is_retryable());

        assert!(!MintError::KeyFormat("short".to_string()).is_retryable());
        assert!(!MintError::rejected("sig", "custom program error: 0x0").is_retryable());
        assert!(!MintError::instruction_failed("spl-token", "bad").is_retryable());
        assert!(!MintError::InsufficientFunds {
            required: 1,
            available: 0
        }
        .is_retryable());
    }

    #[test]
    fn test_only_expiry_requires_rebuild() {
        assert!(MintError::SubmissionExpired {
            signature: String::new(),
            last_valid_block_height: 0,
        }
        .requires_rebuild());
        assert!(!MintError::connection("e", "m").requires_rebuild());
        assert!(!MintError::rejected("sig", "x").requires_rebuild());
    }

    #[test]
    fn test_rejection_reason_is_verbatim() {
        let reason = "Error processing Instruction 0: custom program error: 0x0";
        let err = MintError::rejected("5xSig", reason);
        match &err {
            MintError::OnChainRejection { reason: r, .. } => assert_eq!(r, reason),
            _ => panic!("Expected OnChainRejection variant"),
        }
        assert!(err.to_string().ends_with(reason));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(MintError::KeyFormat("x".to_string()).category(), "key_format");
        assert_eq!(MintError::connection("e", "m").category(), "connection");
        assert_eq!(MintError::rejected("s", "r").category(), "rejected");
    }
}
