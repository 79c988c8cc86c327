//! Network-wide constants shared by both sides of the bridge.

use alloy_primitives::{address, Address};

/// Number of sats in one BTC.
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Fractional digits of a BTC amount expressed in sats.
pub const SATS_DECIMALS: u8 = 8;

/// Upper bound on any amount, the 21M BTC supply cap.
pub const MAX_MONEY_SATS: u64 = 21_000_000 * SATS_PER_BTC;

/// Default number of decimals of the L2 base token.
pub const DEFAULT_L2_BASE_TOKEN_DECIMALS: u8 = 18;

/// Reserved address of the L2 system contract that accounts for the base token.
pub const L2_BASE_TOKEN_ADDRESS: Address = address!("000000000000000000000000000000000000800a");

/// Tag prefixed to the L2 receiver in a deposit's OP_RETURN output.
pub const DEPOSIT_TAG: &[u8] = b"VIA_PROTOCOL:DEPOSIT:";

/// Marker pushed first inside every inscription envelope.
pub const INSCRIPTION_PROTOCOL_MARKER: &[u8] = b"via_inscription_protocol";

/// Envelope kind of a proof DA reference inscription.
pub const PROOF_DA_REFERENCE_KIND: &[u8] = b"ProofDAReference";

/// Envelope kind of an L1 batch DA reference inscription.
pub const L1_BATCH_DA_REFERENCE_KIND: &[u8] = b"L1BatchDAReference";

/// Outputs below this value are not relayed by default policy.
pub const DUST_LIMIT_SATS: u64 = 546;
