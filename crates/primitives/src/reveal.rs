use std::{fmt, str::FromStr};

use bitcoin::Txid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a 64-character hex transaction id")]
pub struct RevealTxIdError(pub String);

/// Id of the base-layer transaction that reveals a batch proof's DA reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevealTxId(Txid);

impl RevealTxId {
    /// Parses the usual big-endian hex rendering of a txid, with an optional `0x` prefix.
    pub fn parse(raw: &str) -> Result<Self, RevealTxIdError> {
        let trimmed = raw.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if hex_part.len() != 64 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RevealTxIdError(raw.to_owned()));
        }
        Txid::from_str(hex_part)
            .map(Self)
            .map_err(|_| RevealTxIdError(raw.to_owned()))
    }

    pub fn txid(&self) -> Txid {
        self.0
    }
}

impl TryFrom<String> for RevealTxId {
    type Error = RevealTxIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RevealTxId> for String {
    fn from(value: RevealTxId) -> Self {
        value.to_string()
    }
}

impl From<Txid> for RevealTxId {
    fn from(value: Txid) -> Self {
        Self(value)
    }
}

impl fmt::Display for RevealTxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
