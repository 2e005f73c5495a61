//! End-to-end launch flow against the scripted ledger
//!
//! Covers:
//! - Reference launch: 9 decimals, 1,000,000 supply, MyToken/MTK, 500 bps
//! - Validation failures never reach the ledger
//! - Expiry triggers exactly one rebuild with a fresh block-reference

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::signature::{Keypair, Signer};
use token_launch::pipeline::{MintPipeline, PipelineSettings};
use token_launch::rpc::LandingStatus;
use token_launch::submission::{SubmissionConfig, TxState};
use token_launch::test_utils::{MockLedgerRpc, MOCK_FEE};
use token_launch::tx_builder::{derive_associated_token_address, derive_metadata_address};
use token_launch::validation::{Field, RawMintConfig};
use token_launch::MintError;

fn settings() -> PipelineSettings {
    PipelineSettings {
        submission: SubmissionConfig {
            poll_interval: Duration::from_millis(1),
            max_transient_failures: 5,
            details_attempts: 3,
        },
        max_rebuilds: 1,
    }
}

fn reference_config(payer: &Keypair) -> RawMintConfig {
    RawMintConfig {
        network: "devnet".to_string(),
        decimals: 9,
        supply: "1000000".to_string(),
        name: "MyToken".to_string(),
        symbol: "MTK".to_string(),
        image_uri: "https://example.com/mtk.png".to_string(),
        royalty_bps: 500,
        secret_key: payer.to_base58_string(),
        rpc_url: None,
    }
}

#[tokio::test]
async fn test_reference_launch_confirms() {
    let payer = Keypair::new();
    let rpc = Arc::new(MockLedgerRpc::new());
    let pipeline = MintPipeline::new(rpc.clone(), settings());

    let result = pipeline.launch(&reference_config(&payer)).await.unwrap();

    assert_eq!(result.terminal_status, TxState::Confirmed);
    assert_eq!(result.fee, Some(MOCK_FEE));
    assert!(result.fee.unwrap() > 0);
    assert_eq!(
        result.associated_account_address,
        derive_associated_token_address(&payer.pubkey(), &result.mint_address)
    );
    assert_eq!(
        result.metadata_address,
        derive_metadata_address(&result.mint_address)
    );
    assert_eq!(rpc.sent_count(), 1);
    assert_eq!(rpc.sent_signatures()[0], result.signature);
}

#[tokio::test]
async fn test_malformed_key_rejected_before_any_call() {
    let payer = Keypair::new();
    let rpc = Arc::new(MockLedgerRpc::new());
    let pipeline = MintPipeline::new(rpc.clone(), settings());

    let mut config = reference_config(&payer);
    config.secret_key = bs58::encode([7u8; 32]).into_string();

    let err = pipeline.launch(&config).await.unwrap_err();

    assert!(matches!(err, MintError::KeyFormat(_)));
    assert_eq!(rpc.call_count(), 0);
}

#[tokio::test]
async fn test_all_field_errors_reported() {
    let payer = Keypair::new();
    let rpc = Arc::new(MockLedgerRpc::new());
    let pipeline = MintPipeline::new(rpc.clone(), settings());

    let mut config = reference_config(&payer);
    config.decimals = 12;
    config.royalty_bps = 10_001;
    config.symbol = "WAYTOOLONGSYMBOL".to_string();

    match pipeline.launch(&config).await.unwrap_err() {
        MintError::Validation(report) => {
            assert!(report.has_error_for(Field::Decimals));
            assert!(report.has_error_for(Field::Royalty));
            assert!(report.has_error_for(Field::Symbol));
            assert!(!report.has_error_for(Field::Name));
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
    assert_eq!(rpc.call_count(), 0);
}

#[tokio::test]
async fn test_metadata_byte_limits_rejected_before_any_call() {
    let payer = Keypair::new();
    let rpc = Arc::new(MockLedgerRpc::new());
    let pipeline = MintPipeline::new(rpc.clone(), settings());

    // 6 characters but 12 bytes
    let mut config = reference_config(&payer);
    config.symbol = "ÄÄÄÄÄÄ".to_string();
    match pipeline.launch(&config).await.unwrap_err() {
        MintError::Validation(report) => assert!(report.has_error_for(Field::Symbol)),
        other => panic!("Expected Validation, got {:?}", other),
    }

    let mut config = reference_config(&payer);
    config.image_uri = format!("https://example.com/{}.png", "a".repeat(200));
    match pipeline.launch(&config).await.unwrap_err() {
        MintError::Validation(report) => assert!(report.has_error_for(Field::ImageUri)),
        other => panic!("Expected Validation, got {:?}", other),
    }

    assert_eq!(rpc.call_count(), 0);
}

#[tokio::test]
async fn test_expired_launch_rebuilt_once() {
    let payer = Keypair::new();
    let rpc = Arc::new(MockLedgerRpc::new().with_default_status(None));
    let ceiling = rpc.last_valid_block_height_for_tests();
    rpc.script_block_heights(vec![ceiling + 1]);
    rpc.script_statuses(vec![
        Ok(None),
        Ok(None),
        Ok(Some(LandingStatus::Landed { slot: 77 })),
    ]);
    let pipeline = MintPipeline::new(rpc.clone(), settings());

    let result = pipeline.launch(&reference_config(&payer)).await.unwrap();

    assert_eq!(result.attempts, 2);
    assert_eq!(rpc.sent_count(), 2);
    assert_eq!(rpc.blockhash_requests(), 2);
    // Same mint on both attempts, different transactions
    let sent = rpc.sent_signatures();
    assert_ne!(sent[0], sent[1]);
    assert_eq!(result.signature, sent[1]);
}

#[tokio::test]
async fn test_underfunded_payer() {
    let payer = Keypair::new();
    let rpc = Arc::new(MockLedgerRpc::new().with_balance(0));
    let pipeline = MintPipeline::new(rpc.clone(), settings());

    let err = pipeline.launch(&reference_config(&payer)).await.unwrap_err();

    match err {
        MintError::InsufficientFunds { required, available } => {
            assert_eq!(available, 0);
            assert!(required > 0);
        }
        other => panic!("Expected InsufficientFunds, got {:?}", other),
    }
    assert_eq!(rpc.sent_count(), 0);
}
