use std::{fmt, sync::Arc};

use async_trait::async_trait;
use bdk_bitcoind_rpc::bitcoincore_rpc::{
    self,
    json::{EstimateSmartFeeResult, ScanTxOutRequest},
    jsonrpc, Auth, Client, RpcApi,
};
use bitcoin::{Address, FeeRate, Transaction, Txid};
use tokio::task;
use tracing::*;
use via_config::BitcoindConfig;

use super::{BitcoinRpc, BtcRpcError, Utxo, RPC_INVALID_ADDRESS_OR_KEY};

/// [`BitcoinRpc`] backed by bitcoind's JSON-RPC interface.
///
/// The underlying client is blocking, so every call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct BitcoindRpcClient {
    inner: Arc<Client>,
    url: String,
}

impl fmt::Debug for BitcoindRpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitcoindRpcClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl BitcoindRpcClient {
    /// Builds a client for the configured node. No request is made until the first call.
    pub fn new(config: &BitcoindConfig) -> Result<Self, BtcRpcError> {
        let auth = Auth::UserPass(config.rpc_user.clone(), config.rpc_password.clone());
        let client = Client::new(&config.rpc_url, auth).map_err(map_rpc_error)?;
        Ok(Self {
            inner: Arc::new(client),
            url: config.rpc_url.clone(),
        })
    }

    async fn call<T, F>(&self, f: F) -> Result<T, BtcRpcError>
    where
        T: Send + 'static,
        F: FnOnce(&Client) -> Result<T, bitcoincore_rpc::Error> + Send + 'static,
    {
        let client = self.inner.clone();
        task::spawn_blocking(move || f(&client))
            .await
            .map_err(|e| BtcRpcError::Join(e.to_string()))?
            .map_err(map_rpc_error)
    }
}

#[async_trait]
impl BitcoinRpc for BitcoindRpcClient {
    #[instrument(skip_all, fields(%address))]
    async fn fetch_utxos(&self, address: &Address) -> Result<Vec<Utxo>, BtcRpcError> {
        let descriptor = format!("addr({address})");
        let res = self
            .call(move |c| c.scan_tx_out_set_blocking(&[ScanTxOutRequest::Single(descriptor)]))
            .await?;

        let utxos: Vec<Utxo> = res
            .unspents
            .into_iter()
            .map(|u| Utxo {
                txid: u.txid,
                vout: u.vout,
                amount: u.amount,
                script_pubkey: u.script_pub_key,
            })
            .collect();
        debug!(count = utxos.len(), "scanned utxo set");
        Ok(utxos)
    }

    #[instrument(skip(self))]
    async fn estimate_fee_rate(&self, target_blocks: u16) -> Result<Option<FeeRate>, BtcRpcError> {
        let res: EstimateSmartFeeResult = self
            .call(move |c| c.estimate_smart_fee(target_blocks, None))
            .await?;

        if let Some(errors) = res.errors.as_ref().filter(|e| !e.is_empty()) {
            debug!(?errors, "node has no fee estimate");
        }
        // estimatesmartfee reports BTC per kvB.
        Ok(res
            .fee_rate
            .map(|per_kvb| FeeRate::from_sat_per_vb_unchecked(per_kvb.to_sat().div_ceil(1000))))
    }

    #[instrument(skip_all, fields(txid = %tx.compute_txid()))]
    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, BtcRpcError> {
        let tx = tx.clone();
        let txid = self.call(move |c| c.send_raw_transaction(&tx)).await?;
        info!(%txid, "transaction accepted by mempool");
        Ok(txid)
    }

    #[instrument(skip(self))]
    async fn get_transaction(&self, txid: &Txid) -> Result<Option<Transaction>, BtcRpcError> {
        let txid = *txid;
        match self.call(move |c| c.get_raw_transaction(&txid, None)).await {
            Ok(tx) => Ok(Some(tx)),
            Err(BtcRpcError::Rpc { code, .. }) if code == RPC_INVALID_ADDRESS_OR_KEY => {
                debug!("transaction unknown to node");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn map_rpc_error(err: bitcoincore_rpc::Error) -> BtcRpcError {
    match err {
        bitcoincore_rpc::Error::JsonRpc(jsonrpc::Error::Rpc(rpc)) => BtcRpcError::Rpc {
            code: rpc.code,
            message: rpc.message,
        },
        bitcoincore_rpc::Error::JsonRpc(jsonrpc::Error::Transport(e)) => {
            BtcRpcError::Transport(e.to_string())
        }
        bitcoincore_rpc::Error::Io(e) => BtcRpcError::Transport(e.to_string()),
        other => BtcRpcError::UnexpectedResponse(other.to_string()),
    }
}
