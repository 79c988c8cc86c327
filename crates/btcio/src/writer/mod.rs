//! Building and submitting deposit transactions.

pub mod builder;
pub mod submitter;

pub use submitter::{
    BitcoinDepositSubmitter, DepositError, DepositParams, DepositSubmitter, PreparedDeposit,
};
#[cfg(any(test, feature = "test-utils"))]
pub use submitter::MockDepositSubmitter;
