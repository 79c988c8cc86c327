//! Client for the rollup's base-token system contract.

mod base_token;
mod client;
mod errors;

#[cfg(any(test, feature = "test-utils"))]
pub use base_token::MockL2BaseToken;
pub use base_token::{L2BaseToken, SignedWithdrawal, WithdrawalReceipt, WithdrawalStatus};
pub use client::{RpcL2Client, DEFAULT_RECEIPT_POLL_INTERVAL};
pub use errors::{classify_rejection, L2ClientError, RejectionKind};
