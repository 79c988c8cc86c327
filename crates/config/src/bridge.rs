use std::{path::Path, str::FromStr};

use bitcoin::{address::NetworkUnchecked, Address};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use terrors::OneOf;
use thiserror::Error;
use via_primitives::constants::SATS_DECIMALS;

use crate::{
    bitcoind::BitcoindConfig,
    deposit::DepositConfig,
    l2::{ConfirmationWait, L2Config},
    logging::LoggingConfig,
};

/// Prefix of environment variables overriding file values, e.g. `VIA_BRIDGE__L2__RPC_URL`.
pub const ENV_PREFIX: &str = "VIA_BRIDGE";

/// Largest base-token precision the L2 value conversion supports.
const MAX_BASE_TOKEN_DECIMALS: u8 = 36;

/// A config that deserialized fine but describes something unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{section}.rpc_url must be an http(s) url, got '{url}'")]
    BadRpcUrl { section: &'static str, url: String },

    #[error("deposit.bridge_address '{addr}' is not a {network} address")]
    BadBridgeAddress { addr: String, network: String },

    #[error("deposit.fallback_fee_rate must be positive")]
    ZeroFeeRate,

    #[error("l2.base_token_decimals must be between 8 and 36, got {0}")]
    BadDecimals(u8),

    #[error("bounded confirmation wait needs a positive timeout_secs")]
    ZeroConfirmationTimeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub bitcoin: BitcoindConfig,
    pub deposit: DepositConfig,
    pub l2: L2Config,

    /// Logging configuration (optional section in TOML).
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Loads the TOML file at `path`, applies `VIA_BRIDGE__*` environment overrides and validates
    /// the result.
    pub fn load(path: &Path) -> Result<Self, OneOf<(config::ConfigError, ConfigError)>> {
        Self::load_with_env(path, None)
    }

    /// Like [`Self::load`], reading overrides from `env` instead of the process environment when
    /// it is given.
    pub fn load_with_env(
        path: &Path,
        env: Option<Map<String, String>>,
    ) -> Result<Self, OneOf<(config::ConfigError, ConfigError)>> {
        let cfg: BridgeConfig = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .map_err(OneOf::new)?
            .try_deserialize()
            .map_err(OneOf::new)?;

        cfg.validate().map_err(OneOf::new)?;
        Ok(cfg)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rpc_url("bitcoin", &self.bitcoin.rpc_url)?;
        check_rpc_url("l2", &self.l2.rpc_url)?;

        let network = self.bitcoin.network;
        let bridge_ok = Address::<NetworkUnchecked>::from_str(&self.deposit.bridge_address)
            .map(|a| a.is_valid_for_network(network))
            .unwrap_or(false);
        if !bridge_ok {
            return Err(ConfigError::BadBridgeAddress {
                addr: self.deposit.bridge_address.clone(),
                network: network.to_string(),
            });
        }

        if self.deposit.fallback_fee_rate == 0 {
            return Err(ConfigError::ZeroFeeRate);
        }

        let decimals = self.l2.base_token_decimals;
        if !(SATS_DECIMALS..=MAX_BASE_TOKEN_DECIMALS).contains(&decimals) {
            return Err(ConfigError::BadDecimals(decimals));
        }

        if self.l2.confirmation == (ConfirmationWait::Bounded { timeout_secs: 0 }) {
            return Err(ConfigError::ZeroConfirmationTimeout);
        }

        Ok(())
    }
}

fn check_rpc_url(section: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::BadRpcUrl {
            section,
            url: url.to_owned(),
        })
    }
}
