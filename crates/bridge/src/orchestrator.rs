//! The three bridge operations: deposit, withdraw and verify batch.

use std::{
    future::{ready, Future},
    sync::Arc,
};

use alloy_primitives::{TxHash, U256};
use bitcoin::Network;
use tokio::select;
use tracing::*;
use via_batch_verifier::{BatchCommitment, BatchVerifier, ProofOracle, VerificationOutcome};
use via_btcio::{
    writer::{BitcoinDepositSubmitter, DepositParams, DepositSubmitter, PreparedDeposit},
    BitcoinRpc, BitcoindRpcClient,
};
use via_config::{BridgeConfig, ConfirmationWait};
use via_l2_client::{L2BaseToken, L2ClientError, RpcL2Client, SignedWithdrawal};
use via_primitives::{validate_amount, L2Address, L2Credential, RevealTxId, WithdrawalAddress};

use crate::{
    errors::{BridgeError, RejectionReason},
    request::{DepositRequest, SubmissionReceipt, WithdrawalRequest},
};

/// Settings the orchestrator applies to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Network withdrawal receivers must belong to.
    pub network: Network,
    pub l2_base_token_decimals: u8,
    pub confirmation: ConfirmationWait,
}

impl BridgeSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            network: config.bitcoin.network,
            l2_base_token_decimals: config.l2.base_token_decimals,
            confirmation: config.l2.confirmation,
        }
    }
}

/// Orchestrator wired to bitcoind and the rollup's JSON-RPC.
pub type RpcBridgeOrchestrator<O> = BridgeOrchestrator<
    BitcoinDepositSubmitter<BitcoindRpcClient>,
    RpcL2Client,
    BitcoindRpcClient,
    O,
>;

/// Entry point for bridge operations.
///
/// Every call is single-shot: inputs are validated before any network round-trip and nothing is
/// retried. Withdrawals are signed with the L2 credential the orchestrator was built with;
/// deposits carry their own base-layer credential.
#[derive(Debug)]
pub struct BridgeOrchestrator<D, L, R, O> {
    deposits: Arc<D>,
    l2: Arc<L>,
    verifier: BatchVerifier<R, O>,
    settings: BridgeSettings,
}

impl<O: ProofOracle> RpcBridgeOrchestrator<O> {
    /// Builds the orchestrator from validated configuration.
    ///
    /// `l2_credential` signs every withdrawal this orchestrator submits, so an orchestrator is
    /// built once per invocation for one L2 account. Deposits carry their own credential in
    /// [`DepositRequest`]. No node is contacted until the first operation.
    pub fn connect(
        config: &BridgeConfig,
        l2_credential: &L2Credential,
        oracle: Arc<O>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;

        let rpc = Arc::new(
            BitcoindRpcClient::new(&config.bitcoin)
                .map_err(|e| BridgeError::Config(e.to_string()))?,
        );
        let params = DepositParams::from_config(&config.deposit, config.bitcoin.network)?;
        let deposits = BitcoinDepositSubmitter::new(Arc::clone(&rpc), params);
        let l2 = RpcL2Client::from_config(&config.l2, l2_credential)?;

        Ok(Self::new(
            Arc::new(deposits),
            Arc::new(l2),
            BatchVerifier::new(rpc, oracle),
            BridgeSettings::from_config(config),
        ))
    }
}

impl<D, L, R, O> BridgeOrchestrator<D, L, R, O>
where
    D: DepositSubmitter,
    L: L2BaseToken,
    R: BitcoinRpc,
    O: ProofOracle,
{
    pub fn new(
        deposits: Arc<D>,
        l2: Arc<L>,
        verifier: BatchVerifier<R, O>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            deposits,
            l2,
            verifier,
            settings,
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Deposits BTC into the bridge for `request.l2_receiver`.
    ///
    /// Succeeds once the base-layer node accepted the transaction into its mempool.
    #[instrument(skip_all, fields(amount = %request.amount, l2_receiver = %request.l2_receiver))]
    pub async fn deposit(
        &self,
        request: &DepositRequest,
    ) -> Result<SubmissionReceipt, BridgeError> {
        let prepared = self.prepare_deposit(request).await?;
        let txid = self
            .deposits
            .broadcast_deposit(&prepared)
            .await
            .map_err(|e| BridgeError::deposit_broadcast(prepared.txid, e))?;
        Ok(SubmissionReceipt::deposit(txid))
    }

    /// Like [`Self::deposit`], giving up when `cancel` resolves.
    ///
    /// Cancelling before the broadcast started returns [`BridgeError::Cancelled`]; cancelling
    /// while it is in flight returns [`BridgeError::Indeterminate`] with the deposit's txid.
    #[instrument(skip_all, fields(amount = %request.amount, l2_receiver = %request.l2_receiver))]
    pub async fn deposit_until<F>(
        &self,
        request: &DepositRequest,
        cancel: F,
    ) -> Result<SubmissionReceipt, BridgeError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let prepared = select! {
            biased;
            _ = &mut cancel => return Err(BridgeError::Cancelled),
            prepared = self.prepare_deposit(request) => prepared?,
        };
        if is_resolved(&mut cancel).await {
            return Err(BridgeError::Cancelled);
        }

        select! {
            biased;
            sent = self.deposits.broadcast_deposit(&prepared) => {
                let txid = sent.map_err(|e| BridgeError::deposit_broadcast(prepared.txid, e))?;
                Ok(SubmissionReceipt::deposit(txid))
            }
            _ = &mut cancel => {
                warn!(txid = %prepared.txid, "deposit cancelled during broadcast");
                Err(BridgeError::Indeterminate {
                    txid: prepared.txid.to_string(),
                    detail: "cancelled while broadcasting".to_owned(),
                })
            }
        }
    }

    async fn prepare_deposit(
        &self,
        request: &DepositRequest,
    ) -> Result<PreparedDeposit, BridgeError> {
        let amount = validate_amount(&request.amount)?;
        let receiver = L2Address::parse(&request.l2_receiver)?;
        let prepared = self
            .deposits
            .prepare_deposit(amount, &receiver, &request.credential)
            .await?;
        debug!(txid = %prepared.txid, fee = %prepared.fee, "deposit prepared");
        Ok(prepared)
    }

    /// Withdraws from the orchestrator's L2 account to `request.l1_receiver`.
    ///
    /// Waits for inclusion according to the configured [`ConfirmationWait`].
    #[instrument(skip_all, fields(amount = %request.amount, l1_receiver = %request.l1_receiver))]
    pub async fn withdraw(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<SubmissionReceipt, BridgeError> {
        let signed = self.prepare_withdrawal(request).await?;
        let tx_hash = signed.tx_hash;
        self.l2
            .broadcast_withdrawal(signed)
            .await
            .map_err(|e| BridgeError::withdrawal_broadcast(tx_hash, e))?;
        self.confirm_withdrawal(tx_hash).await
    }

    /// Like [`Self::withdraw`], giving up when `cancel` resolves.
    ///
    /// Once the withdrawal is in flight, cancelling returns [`BridgeError::Indeterminate`].
    #[instrument(skip_all, fields(amount = %request.amount, l1_receiver = %request.l1_receiver))]
    pub async fn withdraw_until<F>(
        &self,
        request: &WithdrawalRequest,
        cancel: F,
    ) -> Result<SubmissionReceipt, BridgeError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let signed = select! {
            biased;
            _ = &mut cancel => return Err(BridgeError::Cancelled),
            signed = self.prepare_withdrawal(request) => signed?,
        };
        if is_resolved(&mut cancel).await {
            return Err(BridgeError::Cancelled);
        }

        let tx_hash = signed.tx_hash;
        let indeterminate = |detail: &str| {
            warn!(%tx_hash, detail, "withdrawal outcome unknown");
            BridgeError::Indeterminate {
                txid: tx_hash.to_string(),
                detail: detail.to_owned(),
            }
        };

        select! {
            biased;
            sent = self.l2.broadcast_withdrawal(signed) => {
                sent.map_err(|e| BridgeError::withdrawal_broadcast(tx_hash, e))?;
            }
            _ = &mut cancel => return Err(indeterminate("cancelled while broadcasting")),
        }
        select! {
            biased;
            receipt = self.confirm_withdrawal(tx_hash) => receipt,
            _ = &mut cancel => Err(indeterminate("cancelled while awaiting confirmation")),
        }
    }

    async fn prepare_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<SignedWithdrawal, BridgeError> {
        let amount = validate_amount(&request.amount)?;
        let receiver = WithdrawalAddress::new_checked(&request.l1_receiver, self.settings.network)?;
        let value = amount.to_l2_value(self.settings.l2_base_token_decimals)?;

        let balance = self.l2_balance().await?;
        if balance < value {
            return Err(BridgeError::rejected(
                RejectionReason::InsufficientFunds,
                format!("L2 balance {balance} is below withdrawal value {value}"),
            ));
        }

        let signed = self.l2.prepare_withdrawal(value, &receiver).await?;
        debug!(tx_hash = %signed.tx_hash, nonce = signed.nonce, "withdrawal prepared");
        Ok(signed)
    }

    async fn confirm_withdrawal(&self, tx_hash: TxHash) -> Result<SubmissionReceipt, BridgeError> {
        let status = self
            .l2
            .wait_for_confirmation(tx_hash, self.settings.confirmation)
            .await
            .map_err(|e| match e {
                // The node already accepted the transaction, so only a revert is conclusive.
                e @ L2ClientError::Reverted(_) => BridgeError::from(e),
                other => BridgeError::Indeterminate {
                    txid: tx_hash.to_string(),
                    detail: other.to_string(),
                },
            })?;
        Ok(SubmissionReceipt::withdrawal(tx_hash, status))
    }

    /// Base-token balance of the orchestrator's L2 account.
    pub async fn l2_balance(&self) -> Result<U256, BridgeError> {
        let account = self.l2.signer_address();
        Ok(self.l2.balance_of(&account).await?)
    }

    /// Checks the batch proof revealed by `reveal_txid`.
    ///
    /// An id that cannot name a base-layer transaction is reported as
    /// [`VerificationOutcome::NotFound`] without contacting the node.
    #[instrument(skip(self))]
    pub async fn verify_batch(
        &self,
        reveal_txid: &str,
    ) -> Result<VerificationOutcome, BridgeError> {
        let Ok(reveal_txid) = RevealTxId::parse(reveal_txid) else {
            debug!("reveal id is not a transaction id");
            return Ok(VerificationOutcome::not_found(reveal_txid.trim()));
        };
        Ok(self.verifier.verify_batch(&reveal_txid).await?)
    }

    /// [`Self::verify_batch`], treating anything but a valid proof as an error.
    pub async fn require_valid_batch(
        &self,
        reveal_txid: &str,
    ) -> Result<BatchCommitment, BridgeError> {
        Ok(self.verify_batch(reveal_txid).await?.into_result()?)
    }
}

/// Whether `fut` has already completed, without waiting for it.
async fn is_resolved<F: Future<Output = ()> + Unpin>(fut: &mut F) -> bool {
    select! {
        biased;
        _ = fut => true,
        _ = ready(()) => false,
    }
}
