//! Resolves a proof reveal transaction to the batch it proves and asks a proof oracle for a
//! verdict.

mod commitment;
mod errors;
mod oracle;
mod verifier;

pub use commitment::{BatchCommitment, DaBlobRef};
pub use errors::{BatchRejection, VerifierError};
#[cfg(any(test, feature = "test-utils"))]
pub use oracle::MockProofOracle;
pub use oracle::{OracleError, ProofOracle};
pub use verifier::{BatchVerifier, VerificationOutcome};
