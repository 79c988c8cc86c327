use alloy::{
    primitives::TxHash,
    transports::{RpcError, TransportError},
};
use thiserror::Error;

/// Why the rollup node refused a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InsufficientFunds,
    NonceConflict,
    Reverted,
    Other,
}

#[derive(Debug, Error)]
pub enum L2ClientError {
    #[error("invalid L2 credential: {0}")]
    InvalidCredential(String),

    #[error("invalid rpc url '{url}': {reason}")]
    BadUrl { url: String, reason: String },

    #[error("rollup node unreachable: {0}")]
    Network(String),

    #[error("transaction rejected ({kind:?}): {diagnostic}")]
    Rejected {
        kind: RejectionKind,
        diagnostic: String,
    },

    #[error("transaction {0} was included but reverted")]
    Reverted(TxHash),

    #[error("no receipt for {0} within the confirmation budget")]
    ConfirmationTimeout(TxHash),

    #[error("failed to sign transaction: {0}")]
    Signing(String),

    #[error("unexpected response from rollup node: {0}")]
    UnexpectedResponse(String),
}

impl L2ClientError {
    /// Whether the error was raised before anything reached the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential(_) | Self::BadUrl { .. } | Self::Signing(_)
        )
    }
}

/// Sorts a node error message into a [`RejectionKind`].
pub fn classify_rejection(message: &str) -> RejectionKind {
    let msg = message.to_ascii_lowercase();
    if msg.contains("nonce too low")
        || msg.contains("already known")
        || msg.contains("replacement transaction underpriced")
        || msg.contains("nonce too high")
    {
        RejectionKind::NonceConflict
    } else if msg.contains("insufficient funds") || msg.contains("insufficient balance") {
        RejectionKind::InsufficientFunds
    } else if msg.contains("execution reverted") || msg.contains("revert") {
        RejectionKind::Reverted
    } else {
        RejectionKind::Other
    }
}

impl From<TransportError> for L2ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::Rejected {
                kind: classify_rejection(&payload.message),
                diagnostic: format!("{} (code {})", payload.message, payload.code),
            },
            RpcError::Transport(kind) => Self::Network(kind.to_string()),
            other => Self::UnexpectedResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_messages() {
        for msg in [
            "nonce too low: next nonce 4, tx nonce 3",
            "already known",
            "replacement transaction underpriced",
            "Nonce too high",
        ] {
            assert_eq!(classify_rejection(msg), RejectionKind::NonceConflict, "{msg}");
        }
    }

    #[test]
    fn test_funds_and_revert_messages() {
        assert_eq!(
            classify_rejection("insufficient funds for gas * price + value"),
            RejectionKind::InsufficientFunds
        );
        assert_eq!(
            classify_rejection("execution reverted: Not enough balance"),
            RejectionKind::Reverted
        );
        assert_eq!(classify_rejection("gas limit reached"), RejectionKind::Other);
    }

    #[test]
    fn test_locality() {
        assert!(L2ClientError::InvalidCredential("bad".into()).is_local());
        assert!(!L2ClientError::Network("refused".into()).is_local());
    }
}
