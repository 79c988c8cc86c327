//! Inscription envelopes carried in taproot script-path spends.
//!
//! An envelope is an unexecuted branch of the leaf script:
//!
//! ```text
//! <pubkey> OP_CHECKSIG OP_FALSE OP_IF <"via_inscription_protocol"> <kind> <field>... OP_ENDIF
//! ```
//!
//! Fields longer than a single stack element are split across consecutive pushes by the writer.

use bitcoin::{
    opcodes::{
        all::{OP_CHECKSIG, OP_ENDIF, OP_IF},
        OP_FALSE,
    },
    script::{self, Instruction, PushBytesBuf},
    Script, ScriptBuf, Transaction,
};
use thiserror::Error;
use via_primitives::constants::INSCRIPTION_PROTOCOL_MARKER;

/// Largest data push allowed by standardness rules.
pub const MAX_PUSH_SIZE: usize = 520;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("transaction has no inputs")]
    NoInputs,

    #[error("input 0 is not a taproot script-path spend")]
    NotScriptPath,

    #[error("script is not parsable: {0}")]
    Script(String),

    #[error("no inscription envelope in script")]
    Missing,

    #[error("envelope is not terminated by OP_ENDIF")]
    Unterminated,

    #[error("expected a {expected} inscription, found {found}")]
    WrongKind { expected: String, found: String },

    #[error("inscription field '{0}' is missing")]
    MissingField(&'static str),

    #[error("inscription field '{field}' is malformed: {reason}")]
    MalformedField { field: &'static str, reason: String },
}

/// A decoded envelope: its kind tag and the raw pushes that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: Vec<u8>,
    pub fields: Vec<Vec<u8>>,
}

/// Extracts the first envelope of the tapscript revealed by input 0.
pub fn read_envelope(tx: &Transaction) -> Result<Envelope, EnvelopeError> {
    let input = tx.input.first().ok_or(EnvelopeError::NoInputs)?;
    let script = input
        .witness
        .tapscript()
        .ok_or(EnvelopeError::NotScriptPath)?;
    parse_envelope(script)
}

/// Finds the first envelope tagged with the inscription marker in `script`.
pub fn parse_envelope(script: &Script) -> Result<Envelope, EnvelopeError> {
    let instructions: Vec<Instruction<'_>> = script
        .instructions()
        .collect::<Result<_, _>>()
        .map_err(|e| EnvelopeError::Script(e.to_string()))?;

    let mut i = 0;
    while i + 2 < instructions.len() {
        let opens = matches!(&instructions[i], Instruction::PushBytes(b) if b.is_empty())
            && instructions[i + 1] == Instruction::Op(OP_IF);
        let marked = matches!(
            &instructions[i + 2],
            Instruction::PushBytes(b) if b.as_bytes() == INSCRIPTION_PROTOCOL_MARKER
        );
        if opens && marked {
            return collect_body(&instructions[i + 3..]);
        }
        i += 1;
    }
    Err(EnvelopeError::Missing)
}

fn collect_body(body: &[Instruction<'_>]) -> Result<Envelope, EnvelopeError> {
    let mut pushes = Vec::new();
    for ins in body {
        match ins {
            Instruction::PushBytes(b) => pushes.push(b.as_bytes().to_vec()),
            Instruction::Op(op) if *op == OP_ENDIF => {
                let mut pushes = pushes.into_iter();
                let kind = pushes.next().ok_or(EnvelopeError::MissingField("kind"))?;
                return Ok(Envelope {
                    kind,
                    fields: pushes.collect(),
                });
            }
            Instruction::Op(op) => {
                return Err(EnvelopeError::Script(format!(
                    "unexpected {op} inside envelope"
                )))
            }
        }
    }
    Err(EnvelopeError::Unterminated)
}

/// Builds a leaf script carrying `fields` under `kind`, spendable by `xonly_pubkey`.
///
/// A field with more than [`MAX_PUSH_SIZE`] bytes is split over several pushes; the readers treat
/// the last field of a message as the concatenation of all remaining pushes.
pub fn build_envelope_script(
    xonly_pubkey: &[u8; 32],
    kind: &[u8],
    fields: &[&[u8]],
) -> Result<ScriptBuf, EnvelopeError> {
    let mut builder = script::Builder::new()
        .push_slice(xonly_pubkey)
        .push_opcode(OP_CHECKSIG)
        .push_opcode(OP_FALSE)
        .push_opcode(OP_IF)
        .push_slice(push_bytes(INSCRIPTION_PROTOCOL_MARKER)?)
        .push_slice(push_bytes(kind)?);

    for field in fields {
        for chunk in field.chunks(MAX_PUSH_SIZE) {
            builder = builder.push_slice(push_bytes(chunk)?);
        }
    }

    Ok(builder.push_opcode(OP_ENDIF).into_script())
}

fn push_bytes(data: &[u8]) -> Result<PushBytesBuf, EnvelopeError> {
    PushBytesBuf::try_from(data.to_vec()).map_err(|e| EnvelopeError::Script(e.to_string()))
}

#[cfg(test)]
mod tests {
    use bitcoin::{absolute::LockTime, opcodes::all::OP_DROP, transaction::Version};

    use super::*;

    #[test]
    fn test_round_trips_through_script() {
        let long = vec![0xab; 1200];
        let fields = [b"celestia".as_slice(), long.as_slice()];
        let script = build_envelope_script(&[2; 32], b"ProofDAReference", &fields).unwrap();
        let env = parse_envelope(&script).unwrap();
        assert_eq!(env.kind, b"ProofDAReference");
        // 1200 bytes land in three pushes.
        assert_eq!(env.fields.len(), 4);
        assert_eq!(env.fields[0], b"celestia");
        assert_eq!(env.fields[1..].concat(), long);
    }

    #[test]
    fn test_ignores_foreign_envelopes() {
        let script = script::Builder::new()
            .push_opcode(OP_FALSE)
            .push_opcode(OP_IF)
            .push_slice(b"ord")
            .push_opcode(OP_ENDIF)
            .into_script();
        assert_eq!(parse_envelope(&script), Err(EnvelopeError::Missing));
    }

    #[test]
    fn test_rejects_unterminated_envelope() {
        let script = script::Builder::new()
            .push_opcode(OP_FALSE)
            .push_opcode(OP_IF)
            .push_slice(push_bytes(INSCRIPTION_PROTOCOL_MARKER).unwrap())
            .push_slice(b"kind")
            .into_script();
        assert_eq!(parse_envelope(&script), Err(EnvelopeError::Unterminated));
    }

    #[test]
    fn test_rejects_opcodes_in_body() {
        let script = script::Builder::new()
            .push_opcode(OP_FALSE)
            .push_opcode(OP_IF)
            .push_slice(push_bytes(INSCRIPTION_PROTOCOL_MARKER).unwrap())
            .push_slice(b"kind")
            .push_opcode(OP_DROP)
            .push_opcode(OP_ENDIF)
            .into_script();
        assert!(matches!(
            parse_envelope(&script),
            Err(EnvelopeError::Script(_))
        ));
    }

    #[test]
    fn test_requires_script_path_spend() {
        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![],
        };
        assert_eq!(read_envelope(&tx), Err(EnvelopeError::NoInputs));
    }
}
