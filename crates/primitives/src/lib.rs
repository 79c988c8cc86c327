//! Domain types shared across the bridge: amounts, addresses, credentials and the encodings each
//! layer expects for them.

pub mod address;
pub mod amount;
pub mod constants;
pub mod contract;
pub mod credential;
pub mod deposit;
pub mod reveal;

pub use address::{encode_withdrawal_address, AddressError, L2Address, WithdrawalAddress};
pub use amount::{validate_amount, AmountError, BtcAmount};
pub use credential::{BtcCredential, L2Credential};
pub use reveal::{RevealTxId, RevealTxIdError};
