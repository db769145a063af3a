#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unwrap_used)]

pub mod config;
pub mod consensus;
pub mod errors;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;
pub mod watch;
pub mod wire;

pub use consensus::{
    errors::{ConsensusError, ErrorKind},
    processor::{LightClientProcessor, SharedLightClientProcessor},
    types::{SyncState, UpdateOutcome},
};
