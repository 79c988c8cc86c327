//! Bitcoin-denominated amounts as entered by an operator.
//!
//! Amounts are parsed from decimal BTC strings into integer satoshis without going through
//! floating point, so a value either converts exactly or is rejected.

use std::{fmt, str::FromStr};

use alloy_primitives::U256;
use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_MONEY_SATS, SATS_DECIMALS, SATS_PER_BTC};

/// Reasons an operator-supplied amount is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("amount must be finite")]
    NotFinite,

    #[error("amount must not be negative")]
    Negative,

    #[error("amount must be greater than zero")]
    Zero,

    /// More fractional digits than a satoshi can represent.
    #[error("amount '{0}' has more than 8 decimal places and cannot be expressed in sats")]
    TooPrecise(String),

    #[error("amount exceeds the 21M BTC supply")]
    TooLarge,

    #[error("base token decimals ({0}) must be at least 8")]
    UnsupportedDecimals(u8),
}

/// A strictly positive amount of BTC, stored in satoshis.
///
/// Serialized as its sat count; deserialization applies the same checks as [`Self::from_sat`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct BtcAmount(u64);

impl BtcAmount {
    /// Builds an amount from satoshis, rejecting zero and anything above the supply cap.
    pub fn from_sat(sats: u64) -> Result<Self, AmountError> {
        if sats == 0 {
            return Err(AmountError::Zero);
        }
        if sats > MAX_MONEY_SATS {
            return Err(AmountError::TooLarge);
        }
        Ok(Self(sats))
    }

    /// Converts a float BTC value as produced by a CLI parser.
    ///
    /// The float is rendered with its shortest round-trip decimal representation and then parsed
    /// exactly, so `0.5` becomes 50_000_000 sats while `1e-9` is rejected as too precise.
    pub fn from_btc_f64(value: f64) -> Result<Self, AmountError> {
        if value.is_nan() || value.is_infinite() {
            return Err(AmountError::NotFinite);
        }
        if value.is_sign_negative() && value != 0.0 {
            return Err(AmountError::Negative);
        }
        validate_amount(&value.to_string())
    }

    pub fn to_sat(self) -> u64 {
        self.0
    }

    pub fn to_bitcoin_amount(self) -> Amount {
        Amount::from_sat(self.0)
    }

    /// Value in the L2 base token's smallest unit for a token with `decimals` decimals.
    pub fn to_l2_value(self, decimals: u8) -> Result<U256, AmountError> {
        let scale = decimals
            .checked_sub(SATS_DECIMALS)
            .ok_or(AmountError::UnsupportedDecimals(decimals))?;
        let factor = U256::from(10u64).pow(U256::from(scale));
        Ok(U256::from(self.0) * factor)
    }
}

impl fmt::Display for BtcAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SATS_PER_BTC;
        let frac = self.0 % SATS_PER_BTC;
        write!(f, "{whole}.{frac:08} BTC")
    }
}

impl TryFrom<u64> for BtcAmount {
    type Error = AmountError;

    fn try_from(sats: u64) -> Result<Self, Self::Error> {
        Self::from_sat(sats)
    }
}

impl From<BtcAmount> for u64 {
    fn from(value: BtcAmount) -> Self {
        value.0
    }
}

impl FromStr for BtcAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_amount(s)
    }
}

/// Parses and validates a decimal BTC amount.
///
/// Accepts plain decimal notation (`"1"`, `"0.5"`, `".25"`, `"3."`). Rejects anything that is
/// not a number, NaN/infinity spellings, negative values, zero and values that would lose
/// precision when converted to satoshis.
pub fn validate_amount(raw: &str) -> Result<BtcAmount, AmountError> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let unsigned = lowered.strip_prefix(['+', '-']).unwrap_or(&lowered);
    if matches!(unsigned, "nan" | "inf" | "infinity") {
        return Err(AmountError::NotFinite);
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    let well_formed = !(int_part.is_empty() && frac_part.is_empty())
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(AmountError::NotANumber(raw.to_owned()));
    }

    // Trailing zeros carry no precision.
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.len() > SATS_DECIMALS as usize {
        return Err(AmountError::TooPrecise(raw.to_owned()));
    }

    let int_part = int_part.trim_start_matches('0');
    let whole: u64 = if int_part.is_empty() {
        0
    } else if int_part.len() > 8 {
        return Err(AmountError::TooLarge);
    } else {
        int_part
            .parse()
            .map_err(|_| AmountError::NotANumber(raw.to_owned()))?
    };

    let frac: u64 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{frac_part:0<8}");
        padded
            .parse()
            .map_err(|_| AmountError::NotANumber(raw.to_owned()))?
    };

    let sats = whole
        .checked_mul(SATS_PER_BTC)
        .and_then(|w| w.checked_add(frac))
        .ok_or(AmountError::TooLarge)?;

    if sats == 0 {
        return Err(AmountError::Zero);
    }
    if negative {
        return Err(AmountError::Negative);
    }

    BtcAmount::from_sat(sats)
}
