use std::sync::Arc;

use bitcoin::{Transaction, Txid};
use tracing::*;
use via_btcio::{
    reader::{read_l1_batch_da_reference, read_proof_da_reference},
    BitcoinRpc,
};
use via_primitives::RevealTxId;

use crate::{
    commitment::BatchCommitment,
    errors::{BatchRejection, VerifierError},
    oracle::ProofOracle,
};

/// Result of checking one batch proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The oracle accepted the proof.
    Valid(BatchCommitment),
    /// The commitment is well formed but the oracle rejected the proof.
    Invalid(BatchCommitment),
    /// A transaction on the lookup path does not exist.
    NotFound { reference: String },
}

impl VerificationOutcome {
    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            reference: reference.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn into_result(self) -> Result<BatchCommitment, BatchRejection> {
        match self {
            Self::Valid(commitment) => Ok(commitment),
            Self::Invalid(commitment) => Err(BatchRejection::Invalid {
                l1_batch_index: commitment.l1_batch_index,
            }),
            Self::NotFound { reference } => Err(BatchRejection::NotFound { reference }),
        }
    }
}

/// Follows a proof reveal to its batch reveal and checks the proof.
#[derive(Debug)]
pub struct BatchVerifier<R, O> {
    rpc: Arc<R>,
    oracle: Arc<O>,
}

impl<R: BitcoinRpc, O: ProofOracle> BatchVerifier<R, O> {
    pub fn new(rpc: Arc<R>, oracle: Arc<O>) -> Self {
        Self { rpc, oracle }
    }

    async fn fetch(&self, txid: &Txid) -> Result<Option<Transaction>, VerifierError> {
        let tx = self.rpc.get_transaction(txid).await?;
        if tx.is_none() {
            debug!(%txid, "transaction not found");
        }
        Ok(tx)
    }

    #[instrument(skip_all, fields(reveal_txid = %reveal_txid))]
    pub async fn verify_batch(
        &self,
        reveal_txid: &RevealTxId,
    ) -> Result<VerificationOutcome, VerifierError> {
        let proof_txid = reveal_txid.txid();
        let Some(proof_tx) = self.fetch(&proof_txid).await? else {
            return Ok(VerificationOutcome::not_found(proof_txid.to_string()));
        };
        let proof = read_proof_da_reference(&proof_tx).map_err(|source| {
            VerifierError::MalformedReveal {
                txid: proof_txid,
                source,
            }
        })?;

        let batch_txid = proof.l1_batch_reveal_txid;
        let Some(batch_tx) = self.fetch(&batch_txid).await? else {
            return Ok(VerificationOutcome::not_found(batch_txid.to_string()));
        };
        let batch = read_l1_batch_da_reference(&batch_tx).map_err(|source| {
            VerifierError::MalformedReveal {
                txid: batch_txid,
                source,
            }
        })?;

        let commitment = BatchCommitment::from_references(proof_txid, proof, batch);
        debug!(
            l1_batch_index = commitment.l1_batch_index,
            %batch_txid,
            "resolved batch commitment"
        );

        let valid = self.oracle.verify(&commitment).await?;
        info!(l1_batch_index = commitment.l1_batch_index, valid, "batch proof checked");
        Ok(if valid {
            VerificationOutcome::Valid(commitment)
        } else {
            VerificationOutcome::Invalid(commitment)
        })
    }
}
