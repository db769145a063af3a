//! # beacon-types
//!
//! `beacon_types` is a collection of fork-versioned beacon chain light client types, the
//! consensus presets they are parameterized by, and merkle proof verification.
#![warn(clippy::unwrap_used)]
#![warn(clippy::uninlined_format_args)]

pub mod consensus;
pub mod consensus_spec;
pub mod merkle;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;

pub use consensus::light_client;
pub use consensus_spec::{ConsensusSpec, MainnetConsensusSpec, MinimalConsensusSpec};
