//! OP_RETURN payload that tells the rollup's indexer who to credit for a deposit.

use alloy_primitives::Address;

use crate::{address::L2Address, constants::DEPOSIT_TAG};

/// Builds `DEPOSIT_TAG || receiver`.
pub fn deposit_payload(receiver: &L2Address) -> Vec<u8> {
    let mut buf = Vec::with_capacity(DEPOSIT_TAG.len() + 20);
    buf.extend_from_slice(DEPOSIT_TAG);
    buf.extend_from_slice(receiver.as_slice());
    buf
}

/// Extracts the receiver from an OP_RETURN payload, if it is a deposit tag.
pub fn parse_deposit_payload(payload: &[u8]) -> Option<L2Address> {
    let rest = payload.strip_prefix(DEPOSIT_TAG)?;
    if rest.len() != 20 {
        return None;
    }
    Some(L2Address::from_inner(Address::from_slice(rest)))
}
