use std::time::Duration;

use serde::{Deserialize, Serialize};
use via_primitives::constants::DEFAULT_L2_BASE_TOKEN_DECIMALS;

/// Budget of the default bounded confirmation wait.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 60;

/// How long a withdrawal waits for its transaction to be included.
///
/// ```toml
/// [l2.confirmation]
/// mode = "bounded"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConfirmationWait {
    /// Return as soon as the node accepted the transaction.
    None,
    /// Wait for a receipt, giving up after `timeout_secs`.
    Bounded { timeout_secs: u64 },
    /// Wait for a receipt for as long as it takes.
    Unbounded,
}

impl ConfirmationWait {
    pub fn bounded(timeout: Duration) -> Self {
        Self::Bounded {
            timeout_secs: timeout.as_secs(),
        }
    }

    /// Time budget of a bounded wait.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Self::Bounded { timeout_secs } => Some(Duration::from_secs(*timeout_secs)),
            _ => None,
        }
    }

    pub fn waits(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for ConfirmationWait {
    fn default() -> Self {
        Self::Bounded {
            timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L2Config {
    /// Rollup JSON-RPC endpoint.
    pub rpc_url: String,

    /// Decimals of the L2 base token.
    #[serde(default = "default_base_token_decimals")]
    pub base_token_decimals: u8,

    #[serde(default)]
    pub confirmation: ConfirmationWait,
}

fn default_base_token_decimals() -> u8 {
    DEFAULT_L2_BASE_TOKEN_DECIMALS
}
