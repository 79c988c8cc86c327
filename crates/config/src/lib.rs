//! Operator configuration of the bridge.

pub mod bitcoind;
pub mod bridge;
pub mod deposit;
#[cfg(feature = "test-mode")]
pub mod dev;
pub mod l2;
pub mod logging;

pub use bitcoind::BitcoindConfig;
pub use bridge::{BridgeConfig, ConfigError, ENV_PREFIX};
pub use deposit::DepositConfig;
pub use l2::{ConfirmationWait, L2Config};
pub use logging::LoggingConfig;
