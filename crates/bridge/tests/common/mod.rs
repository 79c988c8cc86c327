//! Fixtures shared by the bridge integration tests.

#![allow(dead_code, unreachable_pub, reason = "each test binary uses a subset")]

use std::{
    future::pending,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use alloy_primitives::{Bytes, TxHash, U256};
use async_trait::async_trait;
use bitcoin::{
    absolute::LockTime, hashes::Hash, transaction::Version, Address, Amount, Network,
    Transaction, Txid,
};
use tokio::sync::{Barrier, Mutex};
use via_batch_verifier::{BatchVerifier, MockProofOracle};
use via_bridge::{BridgeOrchestrator, BridgeSettings, DepositRequest, WithdrawalRequest};
use via_btcio::{
    writer::{DepositError, DepositSubmitter, PreparedDeposit},
    MockBitcoinRpc,
};
use via_config::{dev::dev_depositor_credential, ConfirmationWait};
use via_l2_client::{
    L2BaseToken, L2ClientError, RejectionKind, SignedWithdrawal, WithdrawalStatus,
};
use via_primitives::{BtcAmount, BtcCredential, L2Address, WithdrawalAddress};

pub const BRIDGE_ADDRESS: &str = "bcrt1qx2lk0unukm80qmepjp49hwf9z6xnz0s73k9j56";
pub const L2_RECEIVER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const L1_RECEIVER: &str = BRIDGE_ADDRESS;

pub fn settings(confirmation: ConfirmationWait) -> BridgeSettings {
    BridgeSettings {
        network: Network::Regtest,
        l2_base_token_decimals: 18,
        confirmation,
    }
}

pub fn bridge<D, L>(
    deposits: D,
    l2: L,
    rpc: MockBitcoinRpc,
    oracle: MockProofOracle,
    confirmation: ConfirmationWait,
) -> BridgeOrchestrator<D, L, MockBitcoinRpc, MockProofOracle>
where
    D: DepositSubmitter,
    L: L2BaseToken,
{
    BridgeOrchestrator::new(
        Arc::new(deposits),
        Arc::new(l2),
        BatchVerifier::new(Arc::new(rpc), Arc::new(oracle)),
        settings(confirmation),
    )
}

pub fn deposit_request(amount: &str) -> DepositRequest {
    DepositRequest {
        amount: amount.to_owned(),
        l2_receiver: L2_RECEIVER.to_owned(),
        credential: dev_depositor_credential(),
    }
}

pub fn withdrawal_request(amount: &str) -> WithdrawalRequest {
    WithdrawalRequest {
        amount: amount.to_owned(),
        l1_receiver: L1_RECEIVER.to_owned(),
    }
}

pub fn prepared_deposit(txid_byte: u8) -> PreparedDeposit {
    PreparedDeposit {
        tx: Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![],
        },
        txid: Txid::from_byte_array([txid_byte; 32]),
        fee: Amount::from_sat(386),
        sender: Address::from_str(BRIDGE_ADDRESS)
            .unwrap()
            .assume_checked(),
    }
}

/// Deposit submitter that signs instantly and never hears back from the node.
#[derive(Debug, Default)]
pub struct StallingSubmitter;

#[async_trait]
impl DepositSubmitter for StallingSubmitter {
    async fn prepare_deposit(
        &self,
        _amount: BtcAmount,
        _receiver: &L2Address,
        _credential: &BtcCredential,
    ) -> Result<PreparedDeposit, DepositError> {
        Ok(prepared_deposit(0x42))
    }

    async fn broadcast_deposit(&self, _prepared: &PreparedDeposit) -> Result<Txid, DepositError> {
        pending().await
    }
}

/// Rollup node state shared by several clients signing with the same key.
#[derive(Debug)]
pub struct FakeL2Node {
    nonce: Mutex<u64>,
    balance: U256,
    accepted: AtomicU64,
}

impl FakeL2Node {
    pub fn new(balance: U256) -> Arc<Self> {
        Arc::new(Self {
            nonce: Mutex::new(0),
            balance,
            accepted: AtomicU64::new(0),
        })
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }

    async fn pending_nonce(&self) -> u64 {
        *self.nonce.lock().await
    }

    async fn submit(&self, signed: &SignedWithdrawal) -> Result<TxHash, L2ClientError> {
        let mut nonce = self.nonce.lock().await;
        if signed.nonce != *nonce {
            return Err(L2ClientError::Rejected {
                kind: RejectionKind::NonceConflict,
                diagnostic: format!(
                    "nonce too low: next nonce {}, tx nonce {}",
                    *nonce, signed.nonce
                ),
            });
        }
        *nonce += 1;
        self.accepted.fetch_add(1, Ordering::SeqCst);
        Ok(signed.tx_hash)
    }
}

/// An independent client of [`FakeL2Node`] without any nonce coordination with its peers.
#[derive(Debug)]
pub struct FakeL2Client {
    id: u8,
    node: Arc<FakeL2Node>,
    /// Makes concurrent clients read the pending nonce before any of them broadcasts.
    prepared: Option<Arc<Barrier>>,
    stall_broadcast: bool,
}

impl FakeL2Client {
    pub fn new(id: u8, node: Arc<FakeL2Node>) -> Self {
        Self {
            id,
            node,
            prepared: None,
            stall_broadcast: false,
        }
    }

    pub fn synchronized(mut self, barrier: Arc<Barrier>) -> Self {
        self.prepared = Some(barrier);
        self
    }

    pub fn stalling(mut self) -> Self {
        self.stall_broadcast = true;
        self
    }
}

#[async_trait]
impl L2BaseToken for FakeL2Client {
    fn signer_address(&self) -> L2Address {
        L2Address::parse(L2_RECEIVER).unwrap()
    }

    async fn balance_of(&self, _account: &L2Address) -> Result<U256, L2ClientError> {
        Ok(self.node.balance)
    }

    async fn prepare_withdrawal(
        &self,
        value: U256,
        _l1_receiver: &WithdrawalAddress,
    ) -> Result<SignedWithdrawal, L2ClientError> {
        let nonce = self.node.pending_nonce().await;
        if let Some(barrier) = &self.prepared {
            barrier.wait().await;
        }
        let tx_hash = TxHash::repeat_byte(self.id);
        Ok(SignedWithdrawal::new(tx_hash, nonce, value, Bytes::new()))
    }

    async fn broadcast_withdrawal(
        &self,
        signed: SignedWithdrawal,
    ) -> Result<TxHash, L2ClientError> {
        if self.stall_broadcast {
            pending::<()>().await;
        }
        self.node.submit(&signed).await
    }

    async fn wait_for_confirmation(
        &self,
        _tx_hash: TxHash,
        wait: ConfirmationWait,
    ) -> Result<WithdrawalStatus, L2ClientError> {
        Ok(if wait.waits() {
            WithdrawalStatus::Confirmed {
                block_number: Some(1),
            }
        } else {
            WithdrawalStatus::Broadcast
        })
    }
}
