use serde::{Deserialize, Serialize};

/// Default fee rate used when the node cannot estimate one, in sat/vB.
const DEFAULT_FALLBACK_FEE_RATE: u64 = 10;

/// Default confirmation target handed to `estimatesmartfee`.
const DEFAULT_FEE_TARGET_BLOCKS: u16 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositConfig {
    /// Base-layer address the bridge watches for deposits.
    pub bridge_address: String,

    /// Fee rate in sat/vB used when fee estimation yields nothing.
    #[serde(default = "default_fallback_fee_rate")]
    pub fallback_fee_rate: u64,

    /// Confirmation target in blocks for fee estimation.
    #[serde(default = "default_fee_target_blocks")]
    pub fee_target_blocks: u16,
}

fn default_fallback_fee_rate() -> u64 {
    DEFAULT_FALLBACK_FEE_RATE
}

fn default_fee_target_blocks() -> u16 {
    DEFAULT_FEE_TARGET_BLOCKS
}
