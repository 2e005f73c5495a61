//! Token supply and metadata definitions
//!
//! `TokenSpec` owns the exact raw-unit amount that gets minted. The amount is
//! computed once, with decimal arithmetic, when a `TokenSpec` is built; no
//! floating point is involved at any magnitude.

use mpl_token_metadata::types::{Collection, Creator, DataV2, Uses};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Highest number of decimals a mint may declare
pub const MAX_DECIMALS: u8 = 9;

/// Metadata name limit, in UTF-8 bytes
pub const MAX_NAME_LEN: usize = 32;

/// Metadata symbol limit, in UTF-8 bytes
pub const MAX_SYMBOL_LEN: usize = 10;

/// Metadata uri limit, in UTF-8 bytes
pub const MAX_URI_LEN: usize = 200;

/// 100% expressed in basis points
pub const MAX_BASIS_POINTS: u16 = 10_000;

/// Reasons a supply/decimals pair cannot be turned into a raw amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("decimals must be between 0 and {MAX_DECIMALS}, got {0}")]
    DecimalsOutOfRange(u8),

    #[error("supply must be greater than zero")]
    NotPositive,

    #[error("supply has more fractional digits than {decimals} decimals allow")]
    TooPrecise { decimals: u8 },

    #[error("supply x 10^{decimals} exceeds the maximum raw amount {max}", max = u64::MAX)]
    Overflow { decimals: u8 },
}

/// Decimals and total supply of the token being created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    decimals: u8,
    total_supply: Decimal,
    raw_amount: u64,
}

impl TokenSpec {
    /// Build a spec, computing `total_supply x 10^decimals` exactly
    pub fn new(decimals: u8, total_supply: Decimal) -> Result<Self, AmountError> {
        let raw_amount = raw_amount(total_supply, decimals)?;
        Ok(Self {
            decimals,
            total_supply,
            raw_amount,
        })
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Decimal {
        self.total_supply
    }

    /// Amount in base units passed to `mint_to`
    pub fn raw_amount(&self) -> u64 {
        self.raw_amount
    }
}

/// Scale a human-readable supply into base units
///
/// Rejects values that would need rounding or that do not fit in a `u64`.
pub fn raw_amount(total_supply: Decimal, decimals: u8) -> Result<u64, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::DecimalsOutOfRange(decimals));
    }
    if total_supply.is_sign_negative() || total_supply.is_zero() {
        return Err(AmountError::NotPositive);
    }

    let scale = Decimal::from(10u64.pow(u32::from(decimals)));
    let scaled = total_supply
        .checked_mul(scale)
        .ok_or(AmountError::Overflow { decimals })?;

    if !scaled.fract().is_zero() {
        return Err(AmountError::TooPrecise { decimals });
    }

    scaled
        .trunc()
        .to_u64()
        .ok_or(AmountError::Overflow { decimals })
}

/// Descriptive metadata attached to the mint
///
/// Creators, collection and uses are carried explicitly and stay `None` for
/// a plain fungible launch.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<Creator>>,
    pub collection: Option<Collection>,
    pub uses: Option<Uses>,
}

impl TokenMetadata {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        uri: impl Into<String>,
        seller_fee_basis_points: u16,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
            seller_fee_basis_points,
            creators: None,
            collection: None,
            uses: None,
        }
    }

    /// Payload for the metadata program
    pub fn to_data_v2(&self) -> DataV2 {
        DataV2 {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            seller_fee_basis_points: self.seller_fee_basis_points,
            creators: self.creators.clone(),
            collection: self.collection.clone(),
            uses: self.uses.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_raw_amount_million_nine_decimals() {
        let spec = TokenSpec::new(9, dec("1000000")).unwrap();
        assert_eq!(spec.raw_amount(), 1_000_000_000_000_000);
    }

    #[test]
    fn test_raw_amount_zero_decimals() {
        assert_eq!(raw_amount(dec("42"), 0).unwrap(), 42);
    }

    #[test]
    fn test_raw_amount_fractional_supply() {
        assert_eq!(raw_amount(dec("1.5"), 2).unwrap(), 150);
        assert_eq!(raw_amount(dec("0.000000001"), 9).unwrap(), 1);
    }

    #[test]
    fn test_raw_amount_no_float_drift() {
        // 0.1 + 0.2 style inputs stay exact
        assert_eq!(raw_amount(dec("0.3"), 9).unwrap(), 300_000_000);
        assert_eq!(
            raw_amount(dec("18446744073.709551615"), 9).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_raw_amount_overflow_rejected() {
        assert_eq!(
            raw_amount(dec("18446744073.709551616"), 9),
            Err(AmountError::Overflow { decimals: 9 })
        );
        assert_eq!(
            raw_amount(dec("100000000000000000000"), 9),
            Err(AmountError::Overflow { decimals: 9 })
        );
    }

    #[test]
    fn test_raw_amount_rejects_sub_unit_precision() {
        assert_eq!(
            raw_amount(dec("1.234"), 2),
            Err(AmountError::TooPrecise { decimals: 2 })
        );
    }

    #[test]
    fn test_raw_amount_rejects_non_positive() {
        assert_eq!(raw_amount(dec("0"), 6), Err(AmountError::NotPositive));
        assert_eq!(raw_amount(dec("-5"), 6), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_raw_amount_rejects_decimals_out_of_range() {
        assert_eq!(
            raw_amount(dec("1"), 10),
            Err(AmountError::DecimalsOutOfRange(10))
        );
    }

    #[test]
    fn test_metadata_optional_fields_absent() {
        let metadata = TokenMetadata::new("MyToken", "MTK", "https://example.com/mtk.json", 500);
        let data = metadata.to_data_v2();
        assert_eq!(data.name, "MyToken");
        assert_eq!(data.symbol, "MTK");
        assert_eq!(data.seller_fee_basis_points, 500);
        assert!(data.creators.is_none());
        assert!(data.collection.is_none());
        assert!(data.uses.is_none());
    }
}
