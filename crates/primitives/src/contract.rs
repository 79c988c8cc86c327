//! Binding of the L2 base-token system contract.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::address::{L2Address, WithdrawalAddress};

sol! {
    /// Base-token accounting entry points exposed by the system contract.
    interface IL2BaseToken {
        function withdraw(bytes memory l1Receiver) external payable;
        function balanceOf(uint256 account) external view returns (uint256);
    }
}

/// Calldata for `withdraw(bytes)` sending funds to `receiver` on the base layer.
pub fn withdrawal_calldata(receiver: &WithdrawalAddress) -> Bytes {
    let call = IL2BaseToken::withdrawCall {
        l1Receiver: receiver.encode(),
    };
    call.abi_encode().into()
}

/// Calldata for `balanceOf(uint256)`, the account left-padded to a full word.
pub fn balance_of_calldata(account: &L2Address) -> Bytes {
    let word = U256::from_be_slice(account.as_slice());
    IL2BaseToken::balanceOfCall { account: word }
        .abi_encode()
        .into()
}

/// Reads the single `uint256` returned by `balanceOf`.
///
/// Returns `None` when the node returned fewer than 32 bytes.
pub fn decode_balance(ret: &[u8]) -> Option<U256> {
    let word = ret.get(..32)?;
    Some(U256::from_be_slice(word))
}
