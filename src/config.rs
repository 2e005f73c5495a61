//! Configuration module for the token launcher
//!
//! Launch parameters come from a TOML file, then CLI overrides, then the
//! secret key is resolved from `--keypair`, the `TOKEN_LAUNCH_SECRET_KEY`
//! environment variable or `[wallet] keypair_path`, in that order. The result
//! is a `RawMintConfig` handed to validation; nothing here checks field
//! semantics beyond submission tuning.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

use crate::pipeline::PipelineSettings;
use crate::submission::SubmissionConfig;
use crate::validation::RawMintConfig;

/// Environment variable holding the payer secret key
pub const SECRET_KEY_ENV: &str = "TOKEN_LAUNCH_SECRET_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub submission: SubmissionTuning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// `devnet` or `mainnet`
    #[serde(default = "default_cluster")]
    pub cluster: String,

    /// Replaces the cluster's public endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

/// Token parameters, kept as raw text and signed integers for the validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_decimals")]
    pub decimals: i64,

    /// Decimal string; `1_000_000` and `1,000,000` are accepted
    #[serde(default)]
    pub supply: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub symbol: String,

    #[serde(default)]
    pub image_uri: String,

    /// Seller fee in basis points
    #[serde(default)]
    pub royalty_bps: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to a keypair file (JSON byte array or base58 text)
    #[serde(default)]
    pub keypair_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionTuning {
    /// Delay between confirmation polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Rebuild cycles after an expired submission
    #[serde(default = "default_max_rebuilds")]
    pub max_rebuilds: u32,

    /// Consecutive failed polls tolerated while confirming
    #[serde(default = "default_max_transient_failures")]
    pub max_transient_failures: u32,

    /// Lookups of fee and block time after confirmation
    #[serde(default = "default_details_attempts")]
    pub details_attempts: u32,
}

// Default value functions
fn default_cluster() -> String { "devnet".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_decimals() -> i64 { 9 }
fn default_poll_interval_ms() -> u64 { 500 }
fn default_max_rebuilds() -> u32 { 1 }
fn default_max_transient_failures() -> u32 { 10 }
fn default_details_attempts() -> u32 { 10 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
            rpc_url: None,
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            supply: String::new(),
            name: String::new(),
            symbol: String::new(),
            image_uri: String::new(),
            royalty_bps: 0,
        }
    }
}

impl Default for SubmissionTuning {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_rebuilds: default_max_rebuilds(),
            max_transient_failures: default_max_transient_failures(),
            details_attempts: default_details_attempts(),
        }
    }
}

/// Values given on the command line, each replacing its config-file field
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cluster: Option<String>,
    pub rpc_url: Option<String>,
    pub decimals: Option<i64>,
    pub supply: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub image_uri: Option<String>,
    pub royalty_bps: Option<i64>,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration after reading `.env` into the environment
    pub fn from_file_with_env(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_file(path)
    }

    /// Check submission tuning; field semantics are left to validation
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.network.timeout_secs == 0 {
            bail!("network.timeout_secs must be > 0");
        }
        if self.submission.poll_interval_ms == 0 {
            bail!("submission.poll_interval_ms must be > 0");
        }
        if self.submission.max_transient_failures == 0 {
            bail!("submission.max_transient_failures must be > 0");
        }
        if self.submission.details_attempts == 0 {
            bail!("submission.details_attempts must be > 0");
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(cluster) = overrides.cluster {
            self.network.cluster = cluster;
        }
        if overrides.rpc_url.is_some() {
            self.network.rpc_url = overrides.rpc_url;
        }
        if let Some(decimals) = overrides.decimals {
            self.token.decimals = decimals;
        }
        if let Some(supply) = overrides.supply {
            self.token.supply = supply;
        }
        if let Some(name) = overrides.name {
            self.token.name = name;
        }
        if let Some(symbol) = overrides.symbol {
            self.token.symbol = symbol;
        }
        if let Some(image_uri) = overrides.image_uri {
            self.token.image_uri = image_uri;
        }
        if let Some(royalty_bps) = overrides.royalty_bps {
            self.token.royalty_bps = royalty_bps;
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            submission: SubmissionConfig {
                poll_interval: Duration::from_millis(self.submission.poll_interval_ms),
                max_transient_failures: self.submission.max_transient_failures,
                details_attempts: self.submission.details_attempts,
            },
            max_rebuilds: self.submission.max_rebuilds,
        }
    }

    /// Resolve the secret key text: `--keypair` file, then env, then config path
    pub fn resolve_secret_key(&self, keypair_flag: Option<&Path>) -> anyhow::Result<Zeroizing<String>> {
        if let Some(path) = keypair_flag {
            return read_secret_file(path);
        }
        if let Ok(value) = std::env::var(SECRET_KEY_ENV) {
            if !value.trim().is_empty() {
                return Ok(Zeroizing::new(value));
            }
        }
        match &self.wallet.keypair_path {
            Some(path) => read_secret_file(&expand_home(path)),
            None => bail!(
                "No secret key: pass --keypair, set {} or configure [wallet] keypair_path",
                SECRET_KEY_ENV
            ),
        }
    }

    /// Raw launch configuration for the validator
    pub fn to_raw(&self, secret_key: &str) -> RawMintConfig {
        RawMintConfig {
            network: self.network.cluster.clone(),
            decimals: self.token.decimals,
            supply: self.token.supply.clone(),
            name: self.token.name.clone(),
            symbol: self.token.symbol.clone(),
            image_uri: self.token.image_uri.clone(),
            royalty_bps: self.token.royalty_bps,
            secret_key: secret_key.to_string(),
            rpc_url: self.network.rpc_url.clone(),
        }
    }
}

fn read_secret_file(path: &Path) -> anyhow::Result<Zeroizing<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keypair file {}", path.display()))?;
    Ok(Zeroizing::new(content))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
