use std::fmt;

use alloy_primitives::TxHash;
use bitcoin::Txid;
use via_l2_client::WithdrawalStatus;
use via_primitives::BtcCredential;

/// Raw operator input for a deposit. Nothing is validated until it reaches the orchestrator.
#[derive(Debug, Clone)]
pub struct DepositRequest {
    /// Amount in BTC, as typed.
    pub amount: String,
    pub l2_receiver: String,
    pub credential: BtcCredential,
}

/// Raw operator input for a withdrawal.
///
/// Carries no credential: it is signed with the L2 credential the orchestrator was connected
/// with, see [`crate::RpcBridgeOrchestrator::connect`].
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    /// Amount in BTC, as typed.
    pub amount: String,
    pub l1_receiver: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Bitcoin,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// In the base-layer mempool; crediting on L2 happens asynchronously.
    Pending,
    /// Accepted by the rollup node, inclusion not awaited.
    Broadcast,
    Confirmed { block_number: Option<u64> },
}

/// Successful outcome of a deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub layer: Layer,
    pub txid: String,
    pub status: SubmissionStatus,
}

impl SubmissionReceipt {
    pub(crate) fn deposit(txid: Txid) -> Self {
        Self {
            layer: Layer::Bitcoin,
            txid: txid.to_string(),
            status: SubmissionStatus::Pending,
        }
    }

    pub(crate) fn withdrawal(tx_hash: TxHash, status: WithdrawalStatus) -> Self {
        let status = match status {
            WithdrawalStatus::Broadcast => SubmissionStatus::Broadcast,
            WithdrawalStatus::Confirmed { block_number } => {
                SubmissionStatus::Confirmed { block_number }
            }
        };
        Self {
            layer: Layer::L2,
            txid: tx_hash.to_string(),
            status,
        }
    }
}

impl fmt::Display for SubmissionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.layer, self.status) {
            (Layer::Bitcoin, _) => write!(f, "deposit {} accepted into the mempool", self.txid),
            (Layer::L2, SubmissionStatus::Confirmed { block_number: Some(n) }) => {
                write!(f, "withdrawal {} confirmed in block {n}", self.txid)
            }
            (Layer::L2, SubmissionStatus::Confirmed { block_number: None }) => {
                write!(f, "withdrawal {} confirmed", self.txid)
            }
            (Layer::L2, _) => write!(f, "withdrawal {} broadcast", self.txid),
        }
    }
}
