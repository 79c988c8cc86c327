//! Ambient plumbing shared by the bridge crates.

pub mod logging;
