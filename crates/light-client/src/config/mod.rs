mod base;
pub mod client_config;
pub mod networks;
mod types;

pub use base::BaseConfig;
pub use types::{ChainConfig, Fork, Forks, SyncProtocolConfig};
