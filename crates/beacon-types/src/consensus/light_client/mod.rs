pub mod bootstrap;
pub mod finality_update;
pub mod header;
pub mod optimistic_update;
pub mod store;
pub mod update;
