//! Base-layer node capability.

use async_trait::async_trait;
use bitcoin::{Address, Amount, FeeRate, ScriptBuf, Transaction, Txid};
use thiserror::Error;

mod client;

pub use client::BitcoindRpcClient;

/// RPC code bitcoind returns for an unknown transaction.
pub(crate) const RPC_INVALID_ADDRESS_OR_KEY: i32 = -5;

#[derive(Debug, Error)]
pub enum BtcRpcError {
    /// Connection, TLS or authentication failure.
    #[error("bitcoind unreachable: {0}")]
    Transport(String),

    #[error("bitcoind rejected the call (code {code}): {message}")]
    Rpc { code: i32, message: String },

    #[error("unexpected bitcoind response: {0}")]
    UnexpectedResponse(String),

    #[error("blocking rpc task failed: {0}")]
    Join(String),
}

impl BtcRpcError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// An unspent output owned by the depositor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub amount: Amount,
    pub script_pubkey: ScriptBuf,
}

/// What the bridge needs from a bitcoin node.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait BitcoinRpc: Send + Sync {
    /// Unspent outputs currently paying `address`.
    async fn fetch_utxos(&self, address: &Address) -> Result<Vec<Utxo>, BtcRpcError>;

    /// Fee rate for confirmation within `target_blocks`, `None` when the node has no estimate.
    async fn estimate_fee_rate(&self, target_blocks: u16) -> Result<Option<FeeRate>, BtcRpcError>;

    /// Hands a signed transaction to the node's mempool.
    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, BtcRpcError>;

    /// Looks up a transaction by id, `None` when the node does not know it.
    async fn get_transaction(&self, txid: &Txid) -> Result<Option<Transaction>, BtcRpcError>;
}
