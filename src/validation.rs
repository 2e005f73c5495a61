//! Pre-flight input validation
//!
//! Every field of the raw launch configuration is checked here, before any
//! RPC call is made. Malformed input therefore never costs a network round
//! trip or leaves partial state behind.
//!
//! `validate` collects all field errors instead of stopping at the first so
//! the caller can re-prompt for everything that is wrong in one pass.

use crate::errors::MintError;
use crate::network::{Network, NetworkProfile};
use crate::token::{
    raw_amount, TokenMetadata, TokenSpec, MAX_BASIS_POINTS, MAX_DECIMALS, MAX_NAME_LEN,
    MAX_SYMBOL_LEN, MAX_URI_LEN,
};
use crate::wallet::{decode_secret_key, PayerIdentity};
use rust_decimal::Decimal;
use serde::Deserialize;
use solana_sdk::signature::Keypair;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Raw, unvalidated launch configuration
///
/// Integers are signed so out-of-range input such as `-1` reaches the
/// validator instead of failing inside the deserializer.
#[derive(Clone, Default, Deserialize)]
pub struct RawMintConfig {
    pub network: String,
    pub decimals: i64,
    pub supply: String,
    pub name: String,
    pub symbol: String,
    pub image_uri: String,
    pub royalty_bps: i64,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

impl fmt::Debug for RawMintConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMintConfig")
            .field("network", &self.network)
            .field("decimals", &self.decimals)
            .field("supply", &self.supply)
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("image_uri", &self.image_uri)
            .field("royalty_bps", &self.royalty_bps)
            .field("secret_key", &"<redacted>")
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}

/// Input fields subject to validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Network,
    Decimals,
    Supply,
    Name,
    Symbol,
    ImageUri,
    Royalty,
    SecretKey,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Network => "network",
            Field::Decimals => "decimals",
            Field::Supply => "supply",
            Field::Name => "name",
            Field::Symbol => "symbol",
            Field::ImageUri => "image_uri",
            Field::Royalty => "royalty_bps",
            Field::SecretKey => "secret_key",
        };
        f.write_str(name)
    }
}

/// A single field-level failure with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub reason: String,
}

impl FieldError {
    fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// All field errors found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error_for(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn record<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Configuration that passed every field rule
#[derive(Debug)]
pub struct ValidatedConfig {
    pub profile: NetworkProfile,
    pub token: TokenSpec,
    pub metadata: TokenMetadata,
    pub payer: PayerIdentity,
}

/// Anything that can hand the core a validated configuration
///
/// The CLI loader implements this over TOML/env/flags; tests implement it
/// with fixed fixtures.
pub trait ConfigSupplier {
    fn supply_config(&self) -> Result<ValidatedConfig, MintError>;
}

impl ConfigSupplier for RawMintConfig {
    fn supply_config(&self) -> Result<ValidatedConfig, MintError> {
        validate(self)
    }
}

pub fn validate_network(value: &str) -> Result<Network, FieldError> {
    Network::from_str(value).map_err(|_| {
        FieldError::new(
            Field::Network,
            format!("'{}' is not a supported network (devnet, mainnet)", value),
        )
    })
}

pub fn validate_decimals(value: i64) -> Result<u8, FieldError> {
    if !(0..=i64::from(MAX_DECIMALS)).contains(&value) {
        return Err(FieldError::new(
            Field::Decimals,
            format!("must be between 0 and {}, got {}", MAX_DECIMALS, value),
        ));
    }
    Ok(value as u8)
}

/// Check the supply is a positive number
///
/// When `decimals` is known, also check the raw amount is representable.
pub fn validate_supply(value: &str, decimals: Option<u8>) -> Result<Decimal, FieldError> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != ',')
        .collect();

    let supply = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| FieldError::new(Field::Supply, format!("'{}' is not a number", value)))?;

    if supply <= Decimal::ZERO {
        return Err(FieldError::new(Field::Supply, "must be greater than zero"));
    }

    if let Some(decimals) = decimals {
        raw_amount(supply, decimals).map_err(|e| FieldError::new(Field::Supply, e.to_string()))?;
    }

    Ok(supply)
}

pub fn validate_name(value: &str) -> Result<String, FieldError> {
    bounded_text(Field::Name, value, MAX_NAME_LEN)
}

pub fn validate_symbol(value: &str) -> Result<String, FieldError> {
    bounded_text(Field::Symbol, value, MAX_SYMBOL_LEN)
}

fn bounded_text(field: Field, value: &str, max: usize) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, "must not be empty"));
    }
    let len = trimmed.chars().count();
    if len > max {
        return Err(FieldError::new(
            field,
            format!("must be at most {} characters, got {}", max, len),
        ));
    }
    within_byte_limit(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// The metadata program measures text fields in UTF-8 bytes
fn within_byte_limit(field: Field, value: &str, max: usize) -> Result<(), FieldError> {
    if value.len() > max {
        return Err(FieldError::new(
            field,
            format!("must be at most {} bytes, got {}", max, value.len()),
        ));
    }
    Ok(())
}

pub fn validate_image_uri(value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| FieldError::new(Field::ImageUri, format!("not a valid URL: {}", e)))?;
    if url.cannot_be_a_base() || url.host_str().map_or(true, str::is_empty) {
        return Err(FieldError::new(
            Field::ImageUri,
            format!("'{}' has no host", trimmed),
        ));
    }
    within_byte_limit(Field::ImageUri, trimmed, MAX_URI_LEN)?;
    Ok(trimmed.to_string())
}

pub fn validate_royalty(value: i64) -> Result<u16, FieldError> {
    if !(0..=i64::from(MAX_BASIS_POINTS)).contains(&value) {
        return Err(FieldError::new(
            Field::Royalty,
            format!(
                "must be between 0 and {} basis points, got {}",
                MAX_BASIS_POINTS, value
            ),
        ));
    }
    Ok(value as u16)
}

pub fn validate_secret_key(value: &str) -> Result<Keypair, FieldError> {
    decode_secret_key(value).map_err(|e| match e {
        MintError::KeyFormat(reason) => FieldError::new(Field::SecretKey, reason),
        other => FieldError::new(Field::SecretKey, other.to_string()),
    })
}

/// Run every field rule and build the validated configuration
///
/// A report whose only failures concern the secret key is surfaced as
/// `MintError::KeyFormat`; any other failure yields `MintError::Validation`.
pub fn validate(raw: &RawMintConfig) -> Result<ValidatedConfig, MintError> {
    let mut report = ValidationReport::default();

    let network = report.record(validate_network(&raw.network));
    let decimals = report.record(validate_decimals(raw.decimals));
    let supply = report.record(validate_supply(&raw.supply, decimals));
    let name = report.record(validate_name(&raw.name));
    let symbol = report.record(validate_symbol(&raw.symbol));
    let uri = report.record(validate_image_uri(&raw.image_uri));
    let royalty = report.record(validate_royalty(raw.royalty_bps));
    let keypair = report.record(validate_secret_key(&raw.secret_key));

    match (network, decimals, supply, name, symbol, uri, royalty, keypair) {
        (
            Some(network),
            Some(decimals),
            Some(supply),
            Some(name),
            Some(symbol),
            Some(uri),
            Some(royalty),
            Some(keypair),
        ) if report.is_empty() => {
            let token = TokenSpec::new(decimals, supply).map_err(|e| {
                MintError::Validation(ValidationReport {
                    errors: vec![FieldError::new(Field::Supply, e.to_string())],
                })
            })?;
            Ok(ValidatedConfig {
                profile: NetworkProfile::resolve(network)
                    .with_endpoint_override(raw.rpc_url.clone()),
                token,
                metadata: TokenMetadata::new(name, symbol, uri, royalty),
                payer: PayerIdentity::from_keypair(keypair),
            })
        }
        _ => {
            if report.errors.iter().all(|e| e.field == Field::SecretKey) {
                let reason = report
                    .errors
                    .first()
                    .map(|e| e.reason.clone())
                    .unwrap_or_default();
                Err(MintError::KeyFormat(reason))
            } else {
                Err(MintError::Validation(report))
            }
        }
    }
}
