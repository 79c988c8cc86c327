//! Builds and signs deposit transactions.
//!
//! A deposit spends the depositor's P2WPKH outputs into
//! `[bridge (amount), OP_RETURN (tag || l2 receiver), change]`, the change output being dropped
//! when it would be dust.

use std::iter;

use bitcoin::{
    absolute::LockTime,
    ecdsa,
    hashes::Hash,
    script::PushBytesBuf,
    secp256k1::{All, Message, Secp256k1},
    sighash::{EcdsaSighashType, SighashCache},
    transaction::Version,
    Address, Amount, CompressedPublicKey, FeeRate, Network, NetworkKind, OutPoint, PrivateKey,
    ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};
use thiserror::Error;
use via_primitives::{constants::DUST_LIMIT_SATS, deposit::deposit_payload, L2Address};

use crate::rpc::Utxo;

/// vsize of version, locktime, in/out counts and the segwit marker, rounded up.
const TX_OVERHEAD_VBYTES: u64 = 11;

/// vsize of one P2WPKH input including its witness.
const P2WPKH_INPUT_VBYTES: u64 = 68;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("not enough funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("invalid depositor key: {0}")]
    InvalidKey(String),

    #[error("deposit payload does not fit an OP_RETURN: {0}")]
    Payload(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// The depositor's key together with the P2WPKH address it controls.
#[derive(Debug, Clone)]
pub struct DepositorKey {
    key: PrivateKey,
    pubkey: CompressedPublicKey,
    address: Address,
}

impl DepositorKey {
    /// Parses a compressed WIF key and checks it belongs to `network`.
    pub fn from_wif(
        secp: &Secp256k1<All>,
        wif: &str,
        network: Network,
    ) -> Result<Self, BuildError> {
        let key = PrivateKey::from_wif(wif).map_err(|e| BuildError::InvalidKey(e.to_string()))?;
        if key.network != NetworkKind::from(network) {
            return Err(BuildError::InvalidKey(format!(
                "key is not for network {network}"
            )));
        }
        let pubkey = CompressedPublicKey::from_private_key(secp, &key)
            .map_err(|e| BuildError::InvalidKey(e.to_string()))?;
        let address = Address::p2wpkh(&pubkey, network);
        Ok(Self {
            key,
            pubkey,
            address,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Everything that determines the shape of a deposit transaction.
#[derive(Debug, Clone)]
pub struct DepositTxParams {
    pub bridge_address: Address,
    pub amount: Amount,
    pub receiver: L2Address,
    pub fee_rate: FeeRate,
    pub change_address: Address,
}

/// An unsigned deposit with the outputs it spends.
#[derive(Debug, Clone)]
pub struct UnsignedDeposit {
    pub tx: Transaction,
    pub prevouts: Vec<TxOut>,
    pub fee: Amount,
}

fn output_vbytes(script: &ScriptBuf) -> u64 {
    // value + script length prefix + script
    8 + 1 + script.len() as u64
}

fn estimate_vsize(n_inputs: usize, outputs: &[TxOut]) -> u64 {
    TX_OVERHEAD_VBYTES
        + P2WPKH_INPUT_VBYTES * n_inputs as u64
        + outputs
            .iter()
            .map(|o| output_vbytes(&o.script_pubkey))
            .sum::<u64>()
}

fn fee_for(fee_rate: FeeRate, vsize: u64) -> u64 {
    fee_rate.to_sat_per_vb_ceil() * vsize
}

/// Selects coins largest-first and lays out the deposit outputs.
pub fn build_deposit_tx(
    params: &DepositTxParams,
    mut utxos: Vec<Utxo>,
) -> Result<UnsignedDeposit, BuildError> {
    let payload = PushBytesBuf::try_from(deposit_payload(&params.receiver))
        .map_err(|e| BuildError::Payload(e.to_string()))?;
    let mut outputs = vec![
        TxOut {
            value: params.amount,
            script_pubkey: params.bridge_address.script_pubkey(),
        },
        TxOut {
            value: Amount::ZERO,
            script_pubkey: ScriptBuf::new_op_return(payload),
        },
    ];
    let change_template = TxOut {
        value: Amount::ZERO,
        script_pubkey: params.change_address.script_pubkey(),
    };
    let with_change: Vec<TxOut> = outputs
        .iter()
        .cloned()
        .chain(iter::once(change_template.clone()))
        .collect();

    utxos.sort_by(|a, b| b.amount.cmp(&a.amount));
    let available: u64 = utxos.iter().map(|u| u.amount.to_sat()).sum();
    let amount = params.amount.to_sat();

    let mut selected = Vec::new();
    let mut sum = 0u64;
    for utxo in utxos {
        sum += utxo.amount.to_sat();
        selected.push(utxo);

        let fee_with_change =
            fee_for(params.fee_rate, estimate_vsize(selected.len(), &with_change));
        let fee_no_change = fee_for(params.fee_rate, estimate_vsize(selected.len(), &outputs));

        let fee = if sum >= amount + fee_with_change + DUST_LIMIT_SATS {
            let change = sum - amount - fee_with_change;
            outputs.push(TxOut {
                value: Amount::from_sat(change),
                script_pubkey: change_template.script_pubkey.clone(),
            });
            fee_with_change
        } else if sum >= amount + fee_no_change {
            // Leftover below dust goes to the miner.
            sum - amount
        } else {
            continue;
        };

        let prevouts = selected
            .iter()
            .map(|u| TxOut {
                value: u.amount,
                script_pubkey: u.script_pubkey.clone(),
            })
            .collect();
        let input = selected
            .iter()
            .map(|u| TxIn {
                previous_output: OutPoint {
                    txid: u.txid,
                    vout: u.vout,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: Witness::new(),
            })
            .collect();

        return Ok(UnsignedDeposit {
            tx: Transaction {
                version: Version::TWO,
                lock_time: LockTime::ZERO,
                input,
                output: outputs,
            },
            prevouts,
            fee: Amount::from_sat(fee),
        });
    }

    let needed = amount + fee_for(params.fee_rate, estimate_vsize(selected.len().max(1), &outputs));
    Err(BuildError::InsufficientFunds {
        needed: Amount::from_sat(needed),
        available: Amount::from_sat(available),
    })
}

/// Signs every input as a segwit v0 P2WPKH spend with `SIGHASH_ALL`.
pub fn sign_deposit_tx(
    secp: &Secp256k1<All>,
    unsigned: UnsignedDeposit,
    key: &DepositorKey,
) -> Result<Transaction, BuildError> {
    let UnsignedDeposit {
        mut tx, prevouts, ..
    } = unsigned;

    let mut sighashes = Vec::with_capacity(tx.input.len());
    {
        let mut cache = SighashCache::new(&tx);
        for (idx, prevout) in prevouts.iter().enumerate() {
            let sighash = cache
                .p2wpkh_signature_hash(
                    idx,
                    &prevout.script_pubkey,
                    prevout.value,
                    EcdsaSighashType::All,
                )
                .map_err(|e| BuildError::Signing(e.to_string()))?;
            sighashes.push(sighash);
        }
    }

    for (input, sighash) in tx.input.iter_mut().zip(sighashes) {
        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = ecdsa::Signature {
            signature: secp.sign_ecdsa(&msg, &key.key.inner),
            sighash_type: EcdsaSighashType::All,
        };
        let mut witness = Witness::new();
        witness.push(signature.to_vec());
        witness.push(key.pubkey.to_bytes());
        input.witness = witness;
    }

    Ok(tx)
}
