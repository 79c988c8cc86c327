//! Fixtures for crates testing against base-layer transactions.

use bitcoin::{
    absolute::LockTime, hashes::Hash, transaction::Version, Amount, OutPoint, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Txid, Witness,
};
use via_primitives::constants::{L1_BATCH_DA_REFERENCE_KIND, PROOF_DA_REFERENCE_KIND};

use crate::reader::{envelope::build_envelope_script, L1BatchDaReference, ProofDaReference};

/// A reveal transaction spending a taproot output through `leaf_script`.
///
/// The signature and control block are placeholders; only their position in the witness matters.
pub fn reveal_tx_with_script(leaf_script: ScriptBuf) -> Transaction {
    let mut control_block = vec![0xc0];
    control_block.extend_from_slice(&[1; 32]);

    let mut witness = Witness::new();
    witness.push([0x11; 64]);
    witness.push(leaf_script.as_bytes());
    witness.push(control_block);

    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::from_byte_array([0xee; 32]),
                vout: 0,
            },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness,
        }],
        output: vec![TxOut {
            value: Amount::from_sat(546),
            script_pubkey: ScriptBuf::new(),
        }],
    }
}

fn reveal_with(kind: &[u8], fields: Vec<Vec<u8>>) -> Transaction {
    let refs: Vec<&[u8]> = fields.iter().map(Vec::as_slice).collect();
    let script = build_envelope_script(&[2; 32], kind, &refs).expect("fixture envelope builds");
    reveal_tx_with_script(script)
}

/// Reveal transaction carrying a proof DA reference.
pub fn proof_reveal_tx(reference: &ProofDaReference) -> Transaction {
    reveal_with(PROOF_DA_REFERENCE_KIND, reference.to_fields())
}

/// Reveal transaction carrying an L1 batch DA reference.
pub fn batch_reveal_tx(reference: &L1BatchDaReference) -> Transaction {
    reveal_with(L1_BATCH_DA_REFERENCE_KIND, reference.to_fields())
}
