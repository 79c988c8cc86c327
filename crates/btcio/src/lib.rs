//! Input-output with Bitcoin for the bridge: node access, deposit submission and inscription
//! reading.

pub mod reader;
pub mod rpc;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub use rpc::MockBitcoinRpc;
pub use rpc::{BitcoinRpc, BitcoindRpcClient, BtcRpcError, Utxo};
