//! Well-known regtest credentials for functional tests.
//!
//! These keys are public. They are only compiled with the `test-mode` feature and are never used
//! unless a caller asks for them by name.

use via_primitives::BtcCredential;

/// WIF of the regtest depositor funded by the local dev stack.
pub const DEV_DEPOSITOR_WIF: &str = "cVZduZu265sWeAqFYygoDEE1FZ7wV9rpW5qdqjRkUehjaUMWLT1R";

/// Returns the public regtest depositor key.
pub fn dev_depositor_credential() -> BtcCredential {
    BtcCredential::new(DEV_DEPOSITOR_WIF)
}
