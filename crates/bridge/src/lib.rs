//! Bridge orchestration between Bitcoin and the rollup: deposits, withdrawals and batch proof
//! verification.

mod errors;
mod logging;
mod orchestrator;
mod report;
mod request;

pub use errors::{BridgeError, ErrorCategory, RejectionReason};
pub use logging::{finalize_logging, init_logging, SERVICE_NAME};
pub use orchestrator::{BridgeOrchestrator, BridgeSettings, RpcBridgeOrchestrator};
pub use report::{internal_error, user_error, DisplayableError, DisplayedError};
pub use request::{DepositRequest, Layer, SubmissionReceipt, SubmissionStatus, WithdrawalRequest};
pub use via_batch_verifier::{BatchCommitment, OracleError, ProofOracle, VerificationOutcome};
