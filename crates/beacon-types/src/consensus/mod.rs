pub mod constants;
pub mod execution_payload;
pub mod fork;
pub mod header;
pub mod light_client;
pub mod pubkey;
pub mod serde;
pub mod signature;
pub mod sync_committee;
