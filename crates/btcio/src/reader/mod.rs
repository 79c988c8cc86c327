//! Reading bridge inscriptions from base-layer transactions.

pub mod envelope;
pub mod messages;

pub use envelope::{read_envelope, Envelope, EnvelopeError};
pub use messages::{
    read_l1_batch_da_reference, read_proof_da_reference, L1BatchDaReference, ProofDaReference,
};
