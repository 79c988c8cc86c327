//! Capability interface of the L2 system base-token contract.

use alloy::primitives::{Bytes, TxHash, U256};
use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;
use via_config::ConfirmationWait;
use via_primitives::{L2Address, WithdrawalAddress};

use crate::errors::L2ClientError;

/// A withdrawal signed locally and ready to broadcast.
///
/// While it lives it may hold the signer's nonce lease, so a second withdrawal from the same
/// client cannot pick the same nonce before this one reaches the node.
#[derive(Debug)]
pub struct SignedWithdrawal {
    pub tx_hash: TxHash,
    pub nonce: u64,
    pub value: U256,
    /// EIP-2718 encoding of the signed transaction.
    pub raw: Bytes,
    lease: Option<OwnedMutexGuard<()>>,
}

impl SignedWithdrawal {
    pub fn new(tx_hash: TxHash, nonce: u64, value: U256, raw: Bytes) -> Self {
        Self {
            tx_hash,
            nonce,
            value,
            raw,
            lease: None,
        }
    }

    pub(crate) fn with_lease(mut self, lease: OwnedMutexGuard<()>) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn holds_nonce_lease(&self) -> bool {
        self.lease.is_some()
    }
}

/// Inclusion state of a broadcast withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalStatus {
    /// Accepted by the node; inclusion was not awaited.
    Broadcast,
    /// Included with a successful receipt.
    Confirmed { block_number: Option<u64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub tx_hash: TxHash,
    pub status: WithdrawalStatus,
}

/// Operations of the base-token system contract used by the bridge.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait L2BaseToken: Send + Sync {
    /// Account that signs withdrawals.
    fn signer_address(&self) -> L2Address;

    /// Base-token balance of `account`, in L2 wire units.
    async fn balance_of(&self, account: &L2Address) -> Result<U256, L2ClientError>;

    /// Builds and signs `withdraw(l1_receiver)` carrying `value`, without broadcasting it.
    async fn prepare_withdrawal(
        &self,
        value: U256,
        l1_receiver: &WithdrawalAddress,
    ) -> Result<SignedWithdrawal, L2ClientError>;

    /// Hands a signed withdrawal to the node. Releases the nonce lease when done.
    async fn broadcast_withdrawal(&self, signed: SignedWithdrawal)
        -> Result<TxHash, L2ClientError>;

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        wait: ConfirmationWait,
    ) -> Result<WithdrawalStatus, L2ClientError>;

    /// Prepares, broadcasts and waits according to `wait`.
    async fn submit_withdrawal(
        &self,
        value: U256,
        l1_receiver: &WithdrawalAddress,
        wait: ConfirmationWait,
    ) -> Result<WithdrawalReceipt, L2ClientError> {
        let signed = self.prepare_withdrawal(value, l1_receiver).await?;
        let tx_hash = self.broadcast_withdrawal(signed).await?;
        let status = self.wait_for_confirmation(tx_hash, wait).await?;
        Ok(WithdrawalReceipt { tx_hash, status })
    }
}
