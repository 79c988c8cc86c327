use bitcoin::Txid;
use thiserror::Error;
use via_btcio::{reader::EnvelopeError, BtcRpcError};

use crate::oracle::OracleError;

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("reveal transaction {txid} carries no readable commitment: {source}")]
    MalformedReveal {
        txid: Txid,
        #[source]
        source: EnvelopeError,
    },

    #[error("bitcoin node unavailable: {0}")]
    Unavailable(#[from] BtcRpcError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// A verification that completed without a valid proof.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchRejection {
    #[error("proof for L1 batch {l1_batch_index} failed verification")]
    Invalid { l1_batch_index: u64 },

    #[error("transaction {reference} not found on the base layer")]
    NotFound { reference: String },
}
