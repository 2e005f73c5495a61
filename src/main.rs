//! Token Launch - create an SPL token with metadata in one transaction
//!
//! Loads launch parameters from a TOML file and CLI flags, validates them,
//! then builds, signs, submits and confirms the launch transaction.
//!
//! Exit status is nonzero on any failure.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroize;

use token_launch::config::{AppConfig, ConfigOverrides};
use token_launch::metrics::metrics;
use token_launch::network::Network;
use token_launch::rpc::SolanaRpc;
use token_launch::{ConfigSupplier, MintPipeline, SubmissionResult, ValidatedConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "launch.toml")]
    config: PathBuf,

    /// Cluster to launch on
    #[arg(long, value_enum)]
    network: Option<Network>,

    /// Custom RPC endpoint replacing the cluster default
    #[arg(long)]
    rpc_url: Option<String>,

    /// Token decimals (0-9)
    #[arg(long, allow_negative_numbers = true)]
    decimals: Option<i64>,

    /// Total supply in whole tokens
    #[arg(long)]
    supply: Option<String>,

    /// Token name (max 32 characters)
    #[arg(long)]
    name: Option<String>,

    /// Token symbol (max 10 characters)
    #[arg(long)]
    symbol: Option<String>,

    /// Image or metadata URI
    #[arg(long)]
    image_uri: Option<String>,

    /// Seller fee in basis points (0-10000)
    #[arg(long, allow_negative_numbers = true)]
    royalty_bps: Option<i64>,

    /// Payer keypair file; otherwise TOKEN_LAUNCH_SECRET_KEY or [wallet] keypair_path
    #[arg(short, long)]
    keypair: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs and the result as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    metrics: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            cluster: self.network.map(|n| n.to_string()),
            rpc_url: self.rpc_url.clone(),
            decimals: self.decimals,
            supply: self.supply.clone(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            image_uri: self.image_uri.clone(),
            royalty_bps: self.royalty_bps,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.json)?;

    info!("🚀 Starting token launch");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let outcome = run(&args).await;

    if args.metrics {
        match metrics().render() {
            Ok(text) => println!("{}", text),
            Err(e) => warn!("Failed to render metrics: {}", e),
        }
    }

    if let Err(e) = &outcome {
        error!("❌ Launch failed: {:#}", e);
    }
    outcome
}

async fn run(args: &Args) -> Result<()> {
    info!("📋 Loading configuration from: {}", args.config.display());
    let mut config = load_config(&args.config)?;
    config.apply_overrides(args.overrides());
    config.validate().context("Invalid submission settings")?;

    let secret = config.resolve_secret_key(args.keypair.as_deref())?;
    let mut raw = config.to_raw(&secret);
    drop(secret);
    let validated = raw.supply_config();
    raw.secret_key.zeroize();
    let validated = validated.context("Launch parameters rejected")?;

    print_plan(&validated);

    let rpc = Arc::new(SolanaRpc::new(&validated.profile, config.rpc_timeout()));
    info!("🌐 Using endpoint: {}", validated.profile.cluster_endpoint);

    let pipeline = MintPipeline::new(rpc, config.pipeline_settings());
    let result = pipeline.run(&validated).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.to_json(&validated.profile))?);
    } else {
        print_result(&validated, &result);
    }
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "token_launch=debug,info"
    } else {
        "token_launch=info,warn,error"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &std::path::Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    } else {
        dotenvy::dotenv().ok();
        warn!("Config file '{}' not found, using defaults and flags", path.display());
        Ok(AppConfig::default())
    }
}

fn print_plan(config: &ValidatedConfig) {
    info!("🎯 Network: {}", config.profile.network);
    info!("💼 Payer: {}", config.payer.pubkey());
    info!(
        "🪙 {} ({}): supply {} at {} decimals, royalty {} bps",
        config.metadata.name,
        config.metadata.symbol,
        config.token.total_supply(),
        config.token.decimals(),
        config.metadata.seller_fee_basis_points
    );
}

fn print_result(config: &ValidatedConfig, result: &SubmissionResult) {
    let profile = &config.profile;
    println!("✅ Token created on {}", profile.network);
    println!("   Mint:            {}", result.mint_address);
    println!("   Token account:   {}", result.associated_account_address);
    println!("   Metadata:        {}", result.metadata_address);
    println!("   Signature:       {}", result.signature);
    println!("   Status:          {}", result.terminal_status);
    println!("   Slot:            {}", result.slot);
    if let Some(fee) = result.fee {
        println!(
            "   Fee:             {} lamports ({} {})",
            fee,
            lamports_to_display(fee),
            profile.display_symbol
        );
    }
    if let Some(block_time) = result
        .block_time
        .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
    {
        println!("   Block time:      {}", block_time.to_rfc3339());
    }
    println!("   Explorer:        {}", profile.explorer_tx_url(&result.signature));
    println!("   Mint explorer:   {}", profile.explorer_address_url(&result.mint_address));
}

fn lamports_to_display(lamports: u64) -> rust_decimal::Decimal {
    (rust_decimal::Decimal::from(lamports) / rust_decimal::Decimal::from(1_000_000_000u64)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from([
            "token-launch",
            "--network",
            "mainnet",
            "--decimals",
            "6",
            "--royalty-bps",
            "-1",
            "--name",
            "MyToken",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.cluster.as_deref(), Some("mainnet"));
        assert_eq!(overrides.decimals, Some(6));
        assert_eq!(overrides.royalty_bps, Some(-1));
        assert_eq!(overrides.name.as_deref(), Some("MyToken"));
        assert!(overrides.symbol.is_none());
    }

    #[test]
    fn test_unknown_network_rejected_by_parser() {
        assert!(Args::try_parse_from(["token-launch", "--network", "testnet"]).is_err());
        let args = Args::try_parse_from(["token-launch", "--network", "mainnet-beta"]).unwrap();
        assert_eq!(args.network, Some(Network::Mainnet));
    }

    #[test]
    fn test_lamports_display() {
        assert_eq!(lamports_to_display(10_000).to_string(), "0.00001");
    }
}
