use bitcoin::Txid;
use via_btcio::reader::{L1BatchDaReference, ProofDaReference};

/// Location of a blob on a data-availability layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaBlobRef {
    pub da_identifier: String,
    pub blob_id: String,
}

/// Everything the base layer commits to about one proven batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommitment {
    pub proof_reveal_txid: Txid,
    pub l1_batch_reveal_txid: Txid,
    pub l1_batch_hash: [u8; 32],
    pub l1_batch_index: u64,
    pub proof_blob: DaBlobRef,
    pub batch_blob: DaBlobRef,
}

impl BatchCommitment {
    pub(crate) fn from_references(
        proof_reveal_txid: Txid,
        proof: ProofDaReference,
        batch: L1BatchDaReference,
    ) -> Self {
        Self {
            proof_reveal_txid,
            l1_batch_reveal_txid: proof.l1_batch_reveal_txid,
            l1_batch_hash: batch.l1_batch_hash,
            l1_batch_index: batch.l1_batch_index,
            proof_blob: DaBlobRef {
                da_identifier: proof.da_identifier,
                blob_id: proof.blob_id,
            },
            batch_blob: DaBlobRef {
                da_identifier: batch.da_identifier,
                blob_id: batch.blob_id,
            },
        }
    }
}
