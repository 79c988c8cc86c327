//! Caller-owned private keys.
//!
//! Credentials only ever live in memory. The buffers are wiped on drop and never show up in
//! `Debug` output or logs.

use std::fmt;

use zeroize::Zeroizing;

/// WIF-encoded private key controlling the depositor's base-layer funds.
#[derive(Clone)]
pub struct BtcCredential(Zeroizing<String>);

impl BtcCredential {
    pub fn new(wif: impl Into<String>) -> Self {
        Self(Zeroizing::new(wif.into()))
    }

    pub fn expose_wif(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BtcCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BtcCredential(<redacted>)")
    }
}

/// Hex-encoded secp256k1 key of the account that signs L2 transactions.
#[derive(Clone)]
pub struct L2Credential(Zeroizing<String>);

impl L2Credential {
    pub fn new(hex_key: impl Into<String>) -> Self {
        Self(Zeroizing::new(hex_key.into()))
    }

    pub fn expose_hex(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for L2Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("L2Credential(<redacted>)")
    }
}
