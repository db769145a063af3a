pub mod errors;
pub mod processor;
pub mod rpc;
pub mod types;
pub mod utils;
pub mod verify;

mod consensus_client;
pub use crate::consensus::consensus_client::*;

pub mod constants;
