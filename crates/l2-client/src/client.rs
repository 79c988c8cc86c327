use std::{fmt, sync::Arc, time::Duration};

use alloy::{
    eips::eip2718::Encodable2718,
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use tokio::{
    sync::{Mutex, OnceCell},
    time,
};
use tracing::*;
use via_config::{ConfirmationWait, L2Config};
use via_primitives::{
    constants::L2_BASE_TOKEN_ADDRESS, contract, L2Address, L2Credential, WithdrawalAddress,
};

use crate::{
    base_token::{L2BaseToken, SignedWithdrawal, WithdrawalStatus},
    errors::L2ClientError,
};

/// Delay between two receipt lookups while waiting for inclusion.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// [`L2BaseToken`] over the rollup's Ethereum JSON-RPC.
///
/// Transactions are signed locally, so their hash is known before broadcast. Withdrawals prepared
/// through one client are serialized: the nonce lease taken in
/// [`prepare_withdrawal`](L2BaseToken::prepare_withdrawal) is released only once
/// [`broadcast_withdrawal`](L2BaseToken::broadcast_withdrawal) returns.
pub struct RpcL2Client {
    provider: DynProvider,
    wallet: EthereumWallet,
    signer: Address,
    rpc_url: String,
    chain_id: OnceCell<u64>,
    nonce_lease: Arc<Mutex<()>>,
    poll_interval: Duration,
}

impl fmt::Debug for RpcL2Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcL2Client")
            .field("rpc_url", &self.rpc_url)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl RpcL2Client {
    /// Derives the signer from `credential` and sets up an HTTP provider for `rpc_url`.
    ///
    /// Does not contact the node.
    pub fn connect(rpc_url: &str, credential: &L2Credential) -> Result<Self, L2ClientError> {
        let signer = credential
            .expose_hex()
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| L2ClientError::InvalidCredential(e.to_string()))?;
        let url = rpc_url
            .parse::<Url>()
            .map_err(|e| L2ClientError::BadUrl {
                url: rpc_url.to_owned(),
                reason: e.to_string(),
            })?;

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url)
            .erased();
        let address = signer.address();

        Ok(Self {
            provider,
            wallet: EthereumWallet::new(signer),
            signer: address,
            rpc_url: rpc_url.to_owned(),
            chain_id: OnceCell::new(),
            nonce_lease: Arc::new(Mutex::new(())),
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        })
    }

    pub fn from_config(
        config: &L2Config,
        credential: &L2Credential,
    ) -> Result<Self, L2ClientError> {
        Self::connect(&config.rpc_url, credential)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn chain_id(&self) -> Result<u64, L2ClientError> {
        self.chain_id
            .get_or_try_init(|| async {
                self.provider
                    .get_chain_id()
                    .await
                    .map_err(L2ClientError::from)
            })
            .await
            .copied()
    }

    async fn poll_receipt(&self, tx_hash: TxHash) -> Result<WithdrawalStatus, L2ClientError> {
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                if !ReceiptResponse::status(&receipt) {
                    return Err(L2ClientError::Reverted(tx_hash));
                }
                return Ok(WithdrawalStatus::Confirmed {
                    block_number: ReceiptResponse::block_number(&receipt),
                });
            }
            trace!(%tx_hash, "receipt not yet available");
            time::sleep(self.poll_interval).await;
        }
    }
}

/// Legacy transaction calling `withdraw(l1_receiver)` on the base-token contract.
pub(crate) fn withdrawal_request(
    from: Address,
    value: U256,
    l1_receiver: &WithdrawalAddress,
    nonce: u64,
    chain_id: u64,
    gas_price: u128,
) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(from)
        .with_to(L2_BASE_TOKEN_ADDRESS)
        .with_value(value)
        .with_input(contract::withdrawal_calldata(l1_receiver))
        .with_nonce(nonce)
        .with_chain_id(chain_id)
        .with_gas_price(gas_price)
}

pub(crate) async fn sign_request(
    tx: TransactionRequest,
    wallet: &EthereumWallet,
) -> Result<SignedWithdrawal, L2ClientError> {
    let nonce = tx.nonce.unwrap_or_default();
    let value = tx.value.unwrap_or_default();
    let envelope = tx
        .build(wallet)
        .await
        .map_err(|e| L2ClientError::Signing(e.to_string()))?;
    let tx_hash = *envelope.tx_hash();
    let raw = Bytes::from(envelope.encoded_2718());
    Ok(SignedWithdrawal::new(tx_hash, nonce, value, raw))
}

#[async_trait]
impl L2BaseToken for RpcL2Client {
    fn signer_address(&self) -> L2Address {
        L2Address::from_inner(self.signer)
    }

    #[instrument(skip_all, fields(account = %account))]
    async fn balance_of(&self, account: &L2Address) -> Result<U256, L2ClientError> {
        let call = TransactionRequest::default()
            .with_to(L2_BASE_TOKEN_ADDRESS)
            .with_input(contract::balance_of_calldata(account));
        let ret = self.provider.call(call).await?;
        contract::decode_balance(&ret).ok_or_else(|| {
            L2ClientError::UnexpectedResponse(format!("balanceOf returned {} bytes", ret.len()))
        })
    }

    #[instrument(skip_all, fields(signer = %self.signer, %value, %l1_receiver))]
    async fn prepare_withdrawal(
        &self,
        value: U256,
        l1_receiver: &WithdrawalAddress,
    ) -> Result<SignedWithdrawal, L2ClientError> {
        let lease = Arc::clone(&self.nonce_lease).lock_owned().await;

        let chain_id = self.chain_id().await?;
        let nonce = self
            .provider
            .get_transaction_count(self.signer)
            .pending()
            .await?;
        let gas_price = self.provider.get_gas_price().await?;

        let tx = withdrawal_request(self.signer, value, l1_receiver, nonce, chain_id, gas_price);
        let gas_limit = self.provider.estimate_gas(tx.clone()).await?;
        let signed = sign_request(tx.with_gas_limit(gas_limit), &self.wallet).await?;

        debug!(tx_hash = %signed.tx_hash, nonce, gas_limit, "signed withdrawal");
        Ok(signed.with_lease(lease))
    }

    #[instrument(skip_all, fields(tx_hash = %signed.tx_hash, nonce = signed.nonce))]
    async fn broadcast_withdrawal(
        &self,
        signed: SignedWithdrawal,
    ) -> Result<TxHash, L2ClientError> {
        let pending = self.provider.send_raw_transaction(&signed.raw).await?;
        let tx_hash = *pending.tx_hash();
        if tx_hash != signed.tx_hash {
            warn!(node_hash = %tx_hash, "node reported a different transaction hash");
        }
        info!(%tx_hash, "withdrawal accepted by rollup node");
        Ok(tx_hash)
    }

    #[instrument(skip_all, fields(%tx_hash, ?wait))]
    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        wait: ConfirmationWait,
    ) -> Result<WithdrawalStatus, L2ClientError> {
        if !wait.waits() {
            return Ok(WithdrawalStatus::Broadcast);
        }

        let status = match wait.timeout() {
            Some(budget) => time::timeout(budget, self.poll_receipt(tx_hash))
                .await
                .map_err(|_| L2ClientError::ConfirmationTimeout(tx_hash))??,
            None => self.poll_receipt(tx_hash).await?,
        };
        info!(?status, "withdrawal confirmed");
        Ok(status)
    }
}
