//! Addresses on either side of the bridge.

use std::{fmt, str::FromStr};

use alloy_primitives::{Address, Bytes};
use bitcoin::{address::NetworkUnchecked, Address as BtcAddress, Network};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("L2 address '{0}' must be 0x-prefixed")]
    MissingPrefix(String),

    #[error("L2 address '{0}' must be 20 bytes of hex")]
    MalformedL2(String),

    #[error("L2 address '{0}' fails its EIP-55 checksum")]
    BadChecksum(String),

    #[error("withdrawal address must not be empty")]
    EmptyL1,

    #[error("'{addr}' is not a valid bitcoin address: {reason}")]
    MalformedL1 { addr: String, reason: String },

    #[error("'{addr}' is not a {expected} address")]
    WrongNetwork { addr: String, expected: Network },
}

/// An account on the rollup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct L2Address(Address);

impl L2Address {
    /// Parses a `0x`-prefixed 20-byte hex account.
    ///
    /// All-lowercase and all-uppercase hex are accepted as-is. Mixed case is treated as an EIP-55
    /// checksum and must match.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();
        let hex_part = raw
            .strip_prefix("0x")
            .ok_or_else(|| AddressError::MissingPrefix(raw.to_owned()))?;
        if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::MalformedL2(raw.to_owned()));
        }

        let has_lower = hex_part.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = hex_part.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper {
            return Address::parse_checksummed(raw, None)
                .map(Self)
                .map_err(|_| AddressError::BadChecksum(raw.to_owned()));
        }

        Address::from_str(raw)
            .map(Self)
            .map_err(|_| AddressError::MalformedL2(raw.to_owned()))
    }

    pub fn from_inner(addr: Address) -> Self {
        Self(addr)
    }

    pub fn inner(&self) -> Address {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for L2Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

impl FromStr for L2Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for L2Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<L2Address> for String {
    fn from(value: L2Address) -> Self {
        value.to_string()
    }
}

impl From<Address> for L2Address {
    fn from(value: Address) -> Self {
        Self(value)
    }
}

/// A bitcoin address that receives a withdrawal.
///
/// Kept as the operator typed it; the rollup carries the string verbatim and the base layer
/// decides whether it is spendable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WithdrawalAddress(String);

impl WithdrawalAddress {
    /// Wraps a receiver string, only refusing blank input.
    pub fn new(raw: impl Into<String>) -> Result<Self, AddressError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::EmptyL1);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`Self::new`], additionally checking the address parses for `network`.
    pub fn new_checked(raw: impl Into<String>, network: Network) -> Result<Self, AddressError> {
        let addr = Self::new(raw)?;
        let unchecked = BtcAddress::<NetworkUnchecked>::from_str(&addr.0).map_err(|e| {
            AddressError::MalformedL1 {
                addr: addr.0.clone(),
                reason: e.to_string(),
            }
        })?;
        if !unchecked.is_valid_for_network(network) {
            return Err(AddressError::WrongNetwork {
                addr: addr.0,
                expected: network,
            });
        }
        Ok(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes handed to the withdrawal contract for this receiver.
    pub fn encode(&self) -> Bytes {
        encode_withdrawal_address(&self.0)
    }
}

impl fmt::Display for WithdrawalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WithdrawalAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WithdrawalAddress> for String {
    fn from(value: WithdrawalAddress) -> Self {
        value.0
    }
}

/// Encodes a bitcoin address for the L2 withdrawal entry point.
///
/// This is the UTF-8 transcoding of the string and performs no well-formedness check.
pub fn encode_withdrawal_address(addr: &str) -> Bytes {
    Bytes::copy_from_slice(addr.as_bytes())
}
