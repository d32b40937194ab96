//! # Assets and Prices
//!
//! Fixed-point amounts tagged with a symbol. All arithmetic is checked:
//! operands with different symbols never combine, and results that leave the
//! `i64` range are reported instead of wrapping.

use crate::errors::{AssetError, AssetResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Symbols known to the chain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum AssetSymbol {
    /// Liquid core token.
    Cedar,
    /// Dollar-pegged debt token, printed against the median price feed.
    Cbd,
    /// Vesting shares.
    Vests,
}

impl AssetSymbol {
    /// Number of decimal places.
    pub const fn precision(&self) -> u8 {
        match self {
            Self::Cedar | Self::Cbd => 3,
            Self::Vests => 6,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cedar => "CEDAR",
            Self::Cbd => "CBD",
            Self::Vests => "VESTS",
        }
    }

    fn scale(&self) -> i64 {
        10i64.pow(u32::from(self.precision()))
    }
}

impl fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetSymbol {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CEDAR" => Ok(Self::Cedar),
            "CBD" => Ok(Self::Cbd),
            "VESTS" => Ok(Self::Vests),
            other => Err(AssetError::Parse(format!("unknown symbol {other}"))),
        }
    }
}

/// An amount in the smallest unit of its symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: AssetSymbol,
}

impl Asset {
    pub const fn new(amount: i64, symbol: AssetSymbol) -> Self {
        Self { amount, symbol }
    }

    pub const fn cedar(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Cedar)
    }

    pub const fn cbd(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Cbd)
    }

    pub const fn vests(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Vests)
    }

    pub const fn zero(symbol: AssetSymbol) -> Self {
        Self::new(0, symbol)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    fn same_symbol(&self, other: &Asset) -> AssetResult<()> {
        if self.symbol == other.symbol {
            Ok(())
        } else {
            Err(AssetError::SymbolMismatch {
                left: self.symbol,
                right: other.symbol,
            })
        }
    }

    pub fn checked_add(self, other: Asset) -> AssetResult<Asset> {
        self.same_symbol(&other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(AssetError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }

    pub fn checked_sub(self, other: Asset) -> AssetResult<Asset> {
        self.same_symbol(&other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(AssetError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }

    pub fn checked_neg(self) -> AssetResult<Asset> {
        let amount = self.amount.checked_neg().ok_or(AssetError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// Ordering that refuses to compare different symbols.
    pub fn checked_cmp(&self, other: &Asset) -> AssetResult<Ordering> {
        self.same_symbol(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Multiply by `numerator / denominator` with a 128-bit intermediate.
    pub fn scale_by(self, numerator: i64, denominator: i64) -> AssetResult<Asset> {
        if denominator == 0 {
            return Err(AssetError::Overflow);
        }
        let value = i128::from(self.amount) * i128::from(numerator) / i128::from(denominator);
        let amount = i64::try_from(value).map_err(|_| AssetError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = self.symbol.scale();
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let whole = abs / scale as u64;
        let frac = abs % scale as u64;
        write!(
            f,
            "{sign}{whole}.{frac:0width$} {}",
            self.symbol,
            width = usize::from(self.symbol.precision())
        )
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    /// Parses `"1.000 CEDAR"`. The number of decimals must match the symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, symbol) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| AssetError::Parse(s.to_string()))?;
        let symbol: AssetSymbol = symbol.trim().parse()?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if frac.len() != usize::from(symbol.precision()) {
            return Err(AssetError::Parse(format!("bad precision in {s}")));
        }
        let whole: i64 = whole.parse().map_err(|_| AssetError::Parse(s.to_string()))?;
        let frac: i64 = frac.parse().map_err(|_| AssetError::Parse(s.to_string()))?;
        let amount = whole
            .checked_mul(symbol.scale())
            .and_then(|v| v.checked_add(frac))
            .ok_or(AssetError::Overflow)?;
        Ok(Asset::new(if negative { -amount } else { amount }, symbol))
    }
}

/// Exchange rate `base / quote` between two symbols.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl Price {
    pub const fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }

    /// The price used before any feed exists.
    pub const fn null() -> Self {
        Self::new(Asset::cbd(0), Asset::cedar(0))
    }

    pub fn is_null(&self) -> bool {
        self.base.amount == 0 || self.quote.amount == 0
    }

    pub fn validate(&self) -> AssetResult<()> {
        if self.base.symbol == self.quote.symbol {
            return Err(AssetError::InvalidPrice("same symbol on both sides".into()));
        }
        if self.base.amount <= 0 || self.quote.amount <= 0 {
            return Err(AssetError::InvalidPrice("non-positive side".into()));
        }
        Ok(())
    }

    /// Inverted price `quote / base`.
    pub fn invert(&self) -> Price {
        Price::new(self.quote, self.base)
    }

    /// Convert `asset` across this price. Fails if the asset's symbol is not
    /// on either side or if the price has a zero side.
    pub fn convert(&self, asset: Asset) -> AssetResult<Asset> {
        if self.is_null() {
            return Err(AssetError::InvalidPrice("null price".into()));
        }
        let (from, to) = if asset.symbol == self.base.symbol {
            (self.base, self.quote)
        } else if asset.symbol == self.quote.symbol {
            (self.quote, self.base)
        } else {
            return Err(AssetError::SymbolMismatch {
                left: asset.symbol,
                right: self.base.symbol,
            });
        };
        let value = i128::from(asset.amount) * i128::from(to.amount) / i128::from(from.amount);
        let amount = i64::try_from(value).map_err(|_| AssetError::Overflow)?;
        Ok(Asset::new(amount, to.symbol))
    }

    /// Compare two prices of the same market by cross multiplication.
    pub fn checked_cmp(&self, other: &Price) -> AssetResult<Ordering> {
        self.base.same_symbol(&other.base)?;
        self.quote.same_symbol(&other.quote)?;
        let left = i128::from(self.base.amount) * i128::from(other.quote.amount);
        let right = i128::from(other.base.amount) * i128::from(self.quote.amount);
        Ok(left.cmp(&right))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mismatched_symbols_fail() {
        let a = Asset::cedar(1_000);
        let b = Asset::cbd(1_000);
        assert!(matches!(
            a.checked_add(b),
            Err(AssetError::SymbolMismatch { .. })
        ));
        assert!(matches!(
            a.checked_sub(b),
            Err(AssetError::SymbolMismatch { .. })
        ));
        assert!(a.checked_cmp(&b).is_err());
    }

    #[test]
    fn test_overflow_is_reported() {
        let a = Asset::cedar(i64::MAX);
        assert_eq!(a.checked_add(Asset::cedar(1)), Err(AssetError::Overflow));
        assert_eq!(
            Asset::cedar(i64::MIN).checked_neg(),
            Err(AssetError::Overflow)
        );
    }

    #[test]
    fn test_display_and_parse() {
        let a = Asset::cedar(1_234_567);
        assert_eq!(a.to_string(), "1234.567 CEDAR");
        assert_eq!("1234.567 CEDAR".parse::<Asset>(), Ok(a));
        assert_eq!(Asset::vests(-1_500_000).to_string(), "-1.500000 VESTS");
        assert_eq!("-1.500000 VESTS".parse::<Asset>(), Ok(Asset::vests(-1_500_000)));
        assert!("1.00 CEDAR".parse::<Asset>().is_err());
        assert!("1.000 GOLD".parse::<Asset>().is_err());
    }

    #[test]
    fn test_price_convert_both_directions() {
        // 1 CBD buys 4 CEDAR
        let price = Price::new(Asset::cbd(1_000), Asset::cedar(4_000));
        assert_eq!(price.convert(Asset::cedar(8_000)), Ok(Asset::cbd(2_000)));
        assert_eq!(price.convert(Asset::cbd(500)), Ok(Asset::cedar(2_000)));
        assert!(price.convert(Asset::vests(1)).is_err());
        assert!(Price::null().convert(Asset::cbd(1)).is_err());
    }

    #[test]
    fn test_price_ordering_cross_multiplies() {
        let cheap = Price::new(Asset::cbd(1_000), Asset::cedar(4_000));
        let same = Price::new(Asset::cbd(2_000), Asset::cedar(8_000));
        let dear = Price::new(Asset::cbd(1_000), Asset::cedar(2_000));
        assert_eq!(cheap.checked_cmp(&same), Ok(Ordering::Equal));
        assert_eq!(cheap.checked_cmp(&dear), Ok(Ordering::Less));
        assert!(cheap.checked_cmp(&cheap.invert()).is_err());
    }

    proptest! {
        #[test]
        fn prop_add_is_commutative(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
            let x = Asset::cedar(a);
            let y = Asset::cedar(b);
            prop_assert_eq!(x.checked_add(y), y.checked_add(x));
        }

        #[test]
        fn prop_add_is_associative(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000, c in -1_000_000_000_000i64..1_000_000_000_000) {
            let (x, y, z) = (Asset::cbd(a), Asset::cbd(b), Asset::cbd(c));
            let left = x.checked_add(y).and_then(|s| s.checked_add(z));
            let right = y.checked_add(z).and_then(|s| x.checked_add(s));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_sub_undoes_add(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
            let x = Asset::vests(a);
            let y = Asset::vests(b);
            prop_assert_eq!(x.checked_add(y).and_then(|s| s.checked_sub(y)), Ok(x));
        }

        #[test]
        fn prop_mixed_symbols_always_fail(a in any::<i64>(), b in any::<i64>()) {
            let x = Asset::cedar(a);
            let y = Asset::vests(b);
            let add_is_mismatch = matches!(x.checked_add(y), Err(AssetError::SymbolMismatch { .. }));
            let sub_is_mismatch = matches!(x.checked_sub(y), Err(AssetError::SymbolMismatch { .. }));
            prop_assert!(add_is_mismatch);
            prop_assert!(sub_is_mismatch);
        }
    }
}
