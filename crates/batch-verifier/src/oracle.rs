use async_trait::async_trait;
use thiserror::Error;

use crate::commitment::BatchCommitment;

/// The proof oracle could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("proof oracle failed: {0}")]
pub struct OracleError(pub String);

/// External routine deciding whether the proof behind a commitment is valid.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ProofOracle: Send + Sync {
    /// `Ok(false)` means the proof was checked and rejected.
    async fn verify(&self, commitment: &BatchCommitment) -> Result<bool, OracleError>;
}
