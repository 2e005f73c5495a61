//! Network profile resolution
//!
//! Maps a cluster selection to the endpoint, commitment level and explorer
//! settings used for the whole run.

use crate::errors::MintError;
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use std::fmt;
use std::str::FromStr;

const DEVNET_ENDPOINT: &str = "https://api.devnet.solana.com";
const MAINNET_ENDPOINT: &str = "https://api.mainnet-beta.solana.com";
const EXPLORER_BASE: &str = "https://explorer.solana.com";

/// Supported cluster selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Public development cluster
    Devnet,
    /// Production cluster
    #[value(alias = "mainnet-beta")]
    Mainnet,
}

impl FromStr for Network {
    type Err = MintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            other => Err(MintError::Configuration(format!(
                "Unknown network '{}', expected devnet or mainnet",
                other
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Devnet => write!(f, "devnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Immutable per-run cluster settings
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkProfile {
    pub network: Network,
    pub cluster_endpoint: String,
    pub commitment: CommitmentConfig,
    pub explorer_base: String,
    pub display_symbol: &'static str,
}

impl NetworkProfile {
    /// Resolve the profile for a network selection
    pub fn resolve(network: Network) -> Self {
        match network {
            Network::Devnet => Self {
                network,
                cluster_endpoint: DEVNET_ENDPOINT.to_string(),
                commitment: CommitmentConfig::confirmed(),
                explorer_base: EXPLORER_BASE.to_string(),
                display_symbol: "SOL (devnet)",
            },
            Network::Mainnet => Self {
                network,
                cluster_endpoint: MAINNET_ENDPOINT.to_string(),
                commitment: CommitmentConfig::finalized(),
                explorer_base: EXPLORER_BASE.to_string(),
                display_symbol: "SOL",
            },
        }
    }

    /// Replace the cluster endpoint, keeping every other setting
    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(url) = endpoint.filter(|u| !u.trim().is_empty()) {
            self.cluster_endpoint = url;
        }
        self
    }

    /// Explorer link for a transaction signature
    pub fn explorer_tx_url(&self, signature: &Signature) -> String {
        format!("{}/tx/{}{}", self.explorer_base, signature, self.cluster_suffix())
    }

    /// Explorer link for an account address
    pub fn explorer_address_url(&self, address: &Pubkey) -> String {
        format!(
            "{}/address/{}{}",
            self.explorer_base,
            address,
            self.cluster_suffix()
        )
    }

    fn cluster_suffix(&self) -> &'static str {
        match self.network {
            Network::Devnet => "?cluster=devnet",
            Network::Mainnet => "",
        }
    }
}
