//! Typed inscriptions the batch verifier follows.

use bitcoin::{hashes::Hash, Transaction, Txid};
use via_primitives::constants::{L1_BATCH_DA_REFERENCE_KIND, PROOF_DA_REFERENCE_KIND};

use super::envelope::{read_envelope, Envelope, EnvelopeError};

/// Points from a batch proof to the batch it proves and to where the proof blob is stored.
///
/// Fields: `[l1_batch_reveal_txid(32), da_identifier, blob_id...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofDaReference {
    pub l1_batch_reveal_txid: Txid,
    pub da_identifier: String,
    pub blob_id: String,
}

/// Commits to an L1 batch and tells where its pubdata blob is stored.
///
/// Fields: `[l1_batch_hash(32), l1_batch_index(8, big-endian), da_identifier, blob_id...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1BatchDaReference {
    pub l1_batch_hash: [u8; 32],
    pub l1_batch_index: u64,
    pub da_identifier: String,
    pub blob_id: String,
}

fn expect_kind(env: &Envelope, kind: &[u8]) -> Result<(), EnvelopeError> {
    if env.kind == kind {
        Ok(())
    } else {
        Err(EnvelopeError::WrongKind {
            expected: String::from_utf8_lossy(kind).into_owned(),
            found: String::from_utf8_lossy(&env.kind).into_owned(),
        })
    }
}

fn fixed<const N: usize>(
    field: &'static str,
    raw: Option<&Vec<u8>>,
) -> Result<[u8; N], EnvelopeError> {
    let raw = raw.ok_or(EnvelopeError::MissingField(field))?;
    raw.as_slice()
        .try_into()
        .map_err(|_| EnvelopeError::MalformedField {
            field,
            reason: format!("expected {N} bytes, got {}", raw.len()),
        })
}

fn utf8(field: &'static str, raw: Vec<u8>) -> Result<String, EnvelopeError> {
    String::from_utf8(raw).map_err(|e| EnvelopeError::MalformedField {
        field,
        reason: e.to_string(),
    })
}

/// Concatenates the trailing pushes of a field that may have been split.
fn tail(field: &'static str, rest: &[Vec<u8>]) -> Result<Vec<u8>, EnvelopeError> {
    if rest.is_empty() {
        return Err(EnvelopeError::MissingField(field));
    }
    Ok(rest.concat())
}

impl ProofDaReference {
    pub fn from_envelope(env: &Envelope) -> Result<Self, EnvelopeError> {
        expect_kind(env, PROOF_DA_REFERENCE_KIND)?;
        let txid = fixed::<32>("l1_batch_reveal_txid", env.fields.first())?;
        let da_identifier = utf8(
            "da_identifier",
            env.fields
                .get(1)
                .cloned()
                .ok_or(EnvelopeError::MissingField("da_identifier"))?,
        )?;
        let blob_id = utf8("blob_id", tail("blob_id", env.fields.get(2..).unwrap_or_default())?)?;
        Ok(Self {
            l1_batch_reveal_txid: Txid::from_byte_array(txid),
            da_identifier,
            blob_id,
        })
    }

    /// Envelope fields in wire order.
    pub fn to_fields(&self) -> Vec<Vec<u8>> {
        vec![
            self.l1_batch_reveal_txid.to_byte_array().to_vec(),
            self.da_identifier.as_bytes().to_vec(),
            self.blob_id.as_bytes().to_vec(),
        ]
    }
}

impl L1BatchDaReference {
    pub fn from_envelope(env: &Envelope) -> Result<Self, EnvelopeError> {
        expect_kind(env, L1_BATCH_DA_REFERENCE_KIND)?;
        let l1_batch_hash = fixed::<32>("l1_batch_hash", env.fields.first())?;
        let l1_batch_index = u64::from_be_bytes(fixed::<8>("l1_batch_index", env.fields.get(1))?);
        let da_identifier = utf8(
            "da_identifier",
            env.fields
                .get(2)
                .cloned()
                .ok_or(EnvelopeError::MissingField("da_identifier"))?,
        )?;
        let blob_id = utf8("blob_id", tail("blob_id", env.fields.get(3..).unwrap_or_default())?)?;
        Ok(Self {
            l1_batch_hash,
            l1_batch_index,
            da_identifier,
            blob_id,
        })
    }

    /// Envelope fields in wire order.
    pub fn to_fields(&self) -> Vec<Vec<u8>> {
        vec![
            self.l1_batch_hash.to_vec(),
            self.l1_batch_index.to_be_bytes().to_vec(),
            self.da_identifier.as_bytes().to_vec(),
            self.blob_id.as_bytes().to_vec(),
        ]
    }
}

/// Reads the proof DA reference revealed by `tx`.
pub fn read_proof_da_reference(tx: &Transaction) -> Result<ProofDaReference, EnvelopeError> {
    ProofDaReference::from_envelope(&read_envelope(tx)?)
}

/// Reads the L1 batch DA reference revealed by `tx`.
pub fn read_l1_batch_da_reference(tx: &Transaction) -> Result<L1BatchDaReference, EnvelopeError> {
    L1BatchDaReference::from_envelope(&read_envelope(tx)?)
}
