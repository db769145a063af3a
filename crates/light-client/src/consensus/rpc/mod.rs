pub mod mock_rpc;

use alloy_primitives::B256;
use anyhow::Result;
use async_trait::async_trait;
use beacon_types::{
    light_client::{
        bootstrap::LightClientBootstrap, finality_update::LightClientFinalityUpdate,
        optimistic_update::LightClientOptimisticUpdate, update::LightClientUpdate,
    },
    ConsensusSpec,
};

// implements https://github.com/ethereum/beacon-APIs/tree/master/apis/beacon/light_client
#[async_trait]
pub trait ConsensusRpc<S: ConsensusSpec>: Send + Sync + Clone {
    async fn get_bootstrap(&self, block_root: B256) -> Result<LightClientBootstrap<S>>;
    /// Updates of `count` consecutive sync committee periods starting at `period`.
    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<LightClientUpdate<S>>>;
    async fn get_finality_update(&self) -> Result<LightClientFinalityUpdate<S>>;
    async fn get_optimistic_update(&self) -> Result<LightClientOptimisticUpdate<S>>;
    fn name(&self) -> String;
}
