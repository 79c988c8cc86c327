use alloy_primitives::TxHash;
use bitcoin::Txid;
use thiserror::Error;
use via_batch_verifier::{BatchRejection, VerifierError};
use via_btcio::writer::DepositError;
use via_config::ConfigError;
use via_l2_client::{L2ClientError, RejectionKind};
use via_primitives::{AddressError, AmountError};

/// Why a layer refused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    InsufficientFunds,
    NonceConflict,
    Reverted,
    Rejected,
}

impl From<RejectionKind> for RejectionReason {
    fn from(kind: RejectionKind) -> Self {
        match kind {
            RejectionKind::InsufficientFunds => Self::InsufficientFunds,
            RejectionKind::NonceConflict => Self::NonceConflict,
            RejectionKind::Reverted => Self::Reverted,
            RejectionKind::Other => Self::Rejected,
        }
    }
}

/// Operator-facing grouping of [`BridgeError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or configuration, caught before any side effect.
    Input,
    /// A node could not be reached.
    Network,
    /// A node refused the transaction.
    Rejected,
    /// The batch could not be verified or failed verification.
    Verification,
    /// The submission may or may not have taken effect.
    Ambiguous,
    /// The caller cancelled before anything was broadcast.
    Cancelled,
    Internal,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("submission rejected ({reason:?}): {diagnostic}")]
    SubmissionRejected {
        reason: RejectionReason,
        diagnostic: String,
    },

    #[error("cancelled before broadcast")]
    Cancelled,

    #[error("outcome of transaction {txid} is unknown: {detail}")]
    Indeterminate { txid: String, detail: String },

    #[error("malformed reveal transaction: {0}")]
    MalformedReveal(String),

    #[error("batch not found: {reference}")]
    BatchNotFound { reference: String },

    #[error("proof for L1 batch {l1_batch_index} failed verification")]
    VerificationFailed { l1_batch_index: u64 },

    #[error("proof verification unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidAddress(_)
            | Self::InvalidCredential(_)
            | Self::Config(_) => ErrorCategory::Input,
            Self::NetworkUnavailable(_) | Self::VerificationUnavailable(_) => {
                ErrorCategory::Network
            }
            Self::SubmissionRejected { .. } => ErrorCategory::Rejected,
            Self::MalformedReveal(_)
            | Self::BatchNotFound { .. }
            | Self::VerificationFailed { .. } => ErrorCategory::Verification,
            Self::Indeterminate { .. } => ErrorCategory::Ambiguous,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            Self::SubmissionRejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub(crate) fn rejected(reason: RejectionReason, diagnostic: impl Into<String>) -> Self {
        Self::SubmissionRejected {
            reason,
            diagnostic: diagnostic.into(),
        }
    }

    /// Maps a failed `sendrawtransaction`. A transport failure may hit after the node received
    /// the transaction, so it leaves the outcome open.
    pub(crate) fn deposit_broadcast(txid: Txid, err: DepositError) -> Self {
        match err {
            DepositError::Unavailable(detail) => Self::Indeterminate {
                txid: txid.to_string(),
                detail,
            },
            other => other.into(),
        }
    }

    /// Maps a failed `eth_sendRawTransaction`, see [`Self::deposit_broadcast`].
    pub(crate) fn withdrawal_broadcast(tx_hash: TxHash, err: L2ClientError) -> Self {
        match err {
            L2ClientError::Network(detail) => Self::Indeterminate {
                txid: tx_hash.to_string(),
                detail,
            },
            other => other.into(),
        }
    }
}

impl From<DepositError> for BridgeError {
    fn from(err: DepositError) -> Self {
        match err {
            DepositError::InvalidCredential(e) => Self::InvalidCredential(e),
            DepositError::InvalidBridgeAddress(addr) => {
                Self::Config(format!("bridge address '{addr}' does not match the network"))
            }
            e @ DepositError::InsufficientFunds { .. } => {
                Self::rejected(RejectionReason::InsufficientFunds, e.to_string())
            }
            DepositError::Unavailable(e) => Self::NetworkUnavailable(e),
            DepositError::Rejected(e) => Self::rejected(RejectionReason::Rejected, e),
            DepositError::Build(e) => Self::Internal(e),
        }
    }
}

impl From<L2ClientError> for BridgeError {
    fn from(err: L2ClientError) -> Self {
        match err {
            L2ClientError::InvalidCredential(e) => Self::InvalidCredential(e),
            e @ L2ClientError::BadUrl { .. } => Self::Config(e.to_string()),
            L2ClientError::Network(e) => Self::NetworkUnavailable(e),
            L2ClientError::Rejected { kind, diagnostic } => Self::rejected(kind.into(), diagnostic),
            e @ L2ClientError::Reverted(_) => {
                Self::rejected(RejectionReason::Reverted, e.to_string())
            }
            L2ClientError::ConfirmationTimeout(hash) => Self::Indeterminate {
                txid: hash.to_string(),
                detail: "no receipt within the confirmation budget".to_owned(),
            },
            e @ (L2ClientError::Signing(_) | L2ClientError::UnexpectedResponse(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<VerifierError> for BridgeError {
    fn from(err: VerifierError) -> Self {
        match err {
            e @ VerifierError::MalformedReveal { .. } => Self::MalformedReveal(e.to_string()),
            VerifierError::Unavailable(e) => Self::NetworkUnavailable(e.to_string()),
            VerifierError::Oracle(e) => Self::VerificationUnavailable(e.to_string()),
        }
    }
}

impl From<BatchRejection> for BridgeError {
    fn from(rejection: BatchRejection) -> Self {
        match rejection {
            BatchRejection::Invalid { l1_batch_index } => {
                Self::VerificationFailed { l1_batch_index }
            }
            BatchRejection::NotFound { reference } => Self::BatchNotFound { reference },
        }
    }
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash, Amount};

    use super::*;

    #[test]
    fn test_categories_are_distinguishable() {
        let bad_amount = BridgeError::from(AmountError::Zero);
        let rejected = BridgeError::from(L2ClientError::Rejected {
            kind: RejectionKind::NonceConflict,
            diagnostic: "nonce too low".into(),
        });
        let failed = BridgeError::from(BatchRejection::Invalid { l1_batch_index: 3 });

        assert_eq!(bad_amount.category(), ErrorCategory::Input);
        assert_eq!(rejected.category(), ErrorCategory::Rejected);
        assert_eq!(rejected.rejection_reason(), Some(RejectionReason::NonceConflict));
        assert_eq!(failed.category(), ErrorCategory::Verification);
        assert_ne!(bad_amount.to_string(), rejected.to_string());
    }

    #[test]
    fn test_deposit_errors() {
        let err = BridgeError::from(DepositError::InsufficientFunds {
            needed: Amount::from_sat(10_000),
            available: Amount::from_sat(5_000),
        });
        assert_eq!(err.rejection_reason(), Some(RejectionReason::InsufficientFunds));

        let err = BridgeError::from(DepositError::Unavailable("connection refused".into()));
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_broadcast_transport_failures_are_ambiguous() {
        let txid = Txid::all_zeros();
        let err = BridgeError::deposit_broadcast(txid, DepositError::Unavailable("reset".into()));
        match err {
            BridgeError::Indeterminate { txid: reported, .. } => {
                assert_eq!(reported, txid.to_string());
            }
            other => panic!("expected indeterminate outcome, got {other:?}"),
        }

        let err = BridgeError::deposit_broadcast(txid, DepositError::Rejected("dust".into()));
        assert_eq!(err.rejection_reason(), Some(RejectionReason::Rejected));

        let err = BridgeError::withdrawal_broadcast(
            TxHash::repeat_byte(1),
            L2ClientError::Network("timeout".into()),
        );
        assert_eq!(err.category(), ErrorCategory::Ambiguous);
    }

    #[test]
    fn test_confirmation_timeout_is_ambiguous() {
        let err = BridgeError::from(L2ClientError::ConfirmationTimeout(Default::default()));
        assert_eq!(err.category(), ErrorCategory::Ambiguous);
    }
}
