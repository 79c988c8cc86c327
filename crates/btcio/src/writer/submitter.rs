//! Submits deposits to the bridge on the base layer.

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use bitcoin::{
    address::NetworkUnchecked,
    secp256k1::{All, Secp256k1},
    Address, Amount, FeeRate, Network, Transaction, Txid,
};
use thiserror::Error;
use tracing::*;
use via_config::{BitcoindConfig, DepositConfig};
use via_primitives::{BtcAmount, BtcCredential, L2Address};

use super::builder::{
    build_deposit_tx, sign_deposit_tx, BuildError, DepositTxParams, DepositorKey,
};
use crate::rpc::{BitcoinRpc, BitcoindRpcClient, BtcRpcError};

#[derive(Debug, Error)]
pub enum DepositError {
    #[error("invalid depositor credential: {0}")]
    InvalidCredential(String),

    #[error("bridge address '{0}' is not valid for this network")]
    InvalidBridgeAddress(String),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("bitcoind unreachable: {0}")]
    Unavailable(String),

    #[error("deposit rejected by node: {0}")]
    Rejected(String),

    #[error("failed to build deposit: {0}")]
    Build(String),
}

impl From<BuildError> for DepositError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::InsufficientFunds { needed, available } => {
                Self::InsufficientFunds { needed, available }
            }
            BuildError::InvalidKey(e) => Self::InvalidCredential(e),
            other => Self::Build(other.to_string()),
        }
    }
}

impl From<BtcRpcError> for DepositError {
    fn from(err: BtcRpcError) -> Self {
        match err {
            BtcRpcError::Transport(e) => Self::Unavailable(e),
            BtcRpcError::Rpc { code, message } => Self::Rejected(format!("{message} ({code})")),
            other => Self::Rejected(other.to_string()),
        }
    }
}

/// A signed deposit whose txid is known before it is broadcast.
#[derive(Debug, Clone)]
pub struct PreparedDeposit {
    pub tx: Transaction,
    pub txid: Txid,
    pub fee: Amount,
    pub sender: Address,
}

/// Sends BTC into the bridge, crediting an L2 account.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait DepositSubmitter: Send + Sync {
    /// Builds and signs a deposit without touching the mempool.
    async fn prepare_deposit(
        &self,
        amount: BtcAmount,
        receiver: &L2Address,
        credential: &BtcCredential,
    ) -> Result<PreparedDeposit, DepositError>;

    /// Broadcasts a prepared deposit.
    ///
    /// Success only means the node accepted it into its mempool.
    async fn broadcast_deposit(&self, prepared: &PreparedDeposit) -> Result<Txid, DepositError>;

    async fn submit_deposit(
        &self,
        amount: BtcAmount,
        receiver: &L2Address,
        credential: &BtcCredential,
    ) -> Result<Txid, DepositError> {
        let prepared = self.prepare_deposit(amount, receiver, credential).await?;
        self.broadcast_deposit(&prepared).await
    }
}

/// Deposit settings resolved against the node's network.
#[derive(Debug, Clone)]
pub struct DepositParams {
    pub network: Network,
    pub bridge_address: Address,
    pub fallback_fee_rate: FeeRate,
    pub fee_target_blocks: u16,
}

impl DepositParams {
    pub fn from_config(config: &DepositConfig, network: Network) -> Result<Self, DepositError> {
        let bridge_address = Address::<NetworkUnchecked>::from_str(&config.bridge_address)
            .ok()
            .and_then(|a| a.require_network(network).ok())
            .ok_or_else(|| DepositError::InvalidBridgeAddress(config.bridge_address.clone()))?;
        Ok(Self {
            network,
            bridge_address,
            fallback_fee_rate: FeeRate::from_sat_per_vb_unchecked(config.fallback_fee_rate),
            fee_target_blocks: config.fee_target_blocks,
        })
    }
}

/// [`DepositSubmitter`] signing with a local P2WPKH key and broadcasting through bitcoind.
#[derive(Debug)]
pub struct BitcoinDepositSubmitter<R> {
    rpc: Arc<R>,
    params: DepositParams,
    secp: Secp256k1<All>,
}

impl BitcoinDepositSubmitter<BitcoindRpcClient> {
    /// Connects to the configured node.
    pub fn connect(
        bitcoind: &BitcoindConfig,
        deposit: &DepositConfig,
    ) -> Result<Self, DepositError> {
        let params = DepositParams::from_config(deposit, bitcoind.network)?;
        let rpc = BitcoindRpcClient::new(bitcoind)?;
        Ok(Self::new(Arc::new(rpc), params))
    }
}

impl<R: BitcoinRpc> BitcoinDepositSubmitter<R> {
    pub fn new(rpc: Arc<R>, params: DepositParams) -> Self {
        Self {
            rpc,
            params,
            secp: Secp256k1::new(),
        }
    }

    async fn fee_rate(&self) -> Result<FeeRate, DepositError> {
        match self.rpc.estimate_fee_rate(self.params.fee_target_blocks).await {
            Ok(Some(rate)) => Ok(rate),
            Ok(None) => {
                debug!(fallback = %self.params.fallback_fee_rate, "using fallback fee rate");
                Ok(self.params.fallback_fee_rate)
            }
            Err(e) if e.is_transport() => Err(e.into()),
            Err(e) => {
                warn!(%e, "fee estimation failed, using fallback fee rate");
                Ok(self.params.fallback_fee_rate)
            }
        }
    }
}

#[async_trait]
impl<R: BitcoinRpc> DepositSubmitter for BitcoinDepositSubmitter<R> {
    #[instrument(skip(self, credential), fields(%amount, %receiver))]
    async fn prepare_deposit(
        &self,
        amount: BtcAmount,
        receiver: &L2Address,
        credential: &BtcCredential,
    ) -> Result<PreparedDeposit, DepositError> {
        let key = DepositorKey::from_wif(&self.secp, credential.expose_wif(), self.params.network)?;
        let sender = key.address().clone();

        let utxos = self.rpc.fetch_utxos(&sender).await?;
        let fee_rate = self.fee_rate().await?;

        let params = DepositTxParams {
            bridge_address: self.params.bridge_address.clone(),
            amount: amount.to_bitcoin_amount(),
            receiver: *receiver,
            fee_rate,
            change_address: sender.clone(),
        };
        let unsigned = build_deposit_tx(&params, utxos)?;
        let fee = unsigned.fee;
        let tx = sign_deposit_tx(&self.secp, unsigned, &key)?;
        let txid = tx.compute_txid();

        debug!(%txid, %fee, inputs = tx.input.len(), "prepared deposit");
        Ok(PreparedDeposit {
            tx,
            txid,
            fee,
            sender,
        })
    }

    #[instrument(skip_all, fields(txid = %prepared.txid))]
    async fn broadcast_deposit(&self, prepared: &PreparedDeposit) -> Result<Txid, DepositError> {
        let txid = self.rpc.broadcast(&prepared.tx).await?;
        if txid != prepared.txid {
            warn!(expected = %prepared.txid, got = %txid, "node returned a different txid");
        }
        info!(%txid, "deposit broadcast");
        Ok(txid)
    }
}
