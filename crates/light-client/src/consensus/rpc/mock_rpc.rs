use std::{cmp, collections::HashMap, sync::Arc};

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
use parking_lot::RwLock;
use tree_hash::TreeHash;

use super::ConsensusRpc;
use crate::{
    consensus::{constants::MAX_REQUEST_LIGHT_CLIENT_UPDATES, utils::calc_sync_period},
    errors::RpcError,
};

#[derive(Debug)]
struct MockRpcData<S: ConsensusSpec> {
    bootstraps: HashMap<B256, LightClientBootstrap<S>>,
    updates: Vec<LightClientUpdate<S>>,
    finality_update: Option<LightClientFinalityUpdate<S>>,
    optimistic_update: Option<LightClientOptimisticUpdate<S>>,
}

/// An in-memory beacon light client API. Clones share the same data, so a test can keep a
/// handle and feed new updates while a client is running.
#[derive(Debug)]
pub struct MockRpc<S: ConsensusSpec> {
    data: Arc<RwLock<MockRpcData<S>>>,
}

impl<S: ConsensusSpec> Clone for MockRpc<S> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<S: ConsensusSpec> Default for MockRpc<S> {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(MockRpcData {
                bootstraps: HashMap::new(),
                updates: vec![],
                finality_update: None,
                optimistic_update: None,
            })),
        }
    }
}

impl<S: ConsensusSpec> MockRpc<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bootstrap` for the root of its beacon header.
    pub fn insert_bootstrap(&self, bootstrap: LightClientBootstrap<S>) {
        let root = bootstrap.get_beacon_block_header().tree_hash_root();
        self.data.write().bootstraps.insert(root, bootstrap);
    }

    pub fn push_update(&self, update: LightClientUpdate<S>) {
        self.data.write().updates.push(update);
    }

    pub fn set_finality_update(&self, update: LightClientFinalityUpdate<S>) {
        self.data.write().finality_update = Some(update);
    }

    pub fn set_optimistic_update(&self, update: LightClientOptimisticUpdate<S>) {
        self.data.write().optimistic_update = Some(update);
    }
}

#[async_trait]
impl<S: ConsensusSpec> ConsensusRpc<S> for MockRpc<S> {
    async fn get_bootstrap(&self, block_root: B256) -> Result<LightClientBootstrap<S>> {
        self.data
            .read()
            .bootstraps
            .get(&block_root)
            .cloned()
            .ok_or_else(|| RpcError::new("bootstrap", format!("unknown block root {block_root}")).into())
    }

    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<LightClientUpdate<S>>> {
        let count = cmp::min(count, MAX_REQUEST_LIGHT_CLIENT_UPDATES);
        let periods = period..period.saturating_add(count as u64);
        Ok(self
            .data
            .read()
            .updates
            .iter()
            .filter(|update| periods.contains(&calc_sync_period::<S>(update.attested_slot())))
            .cloned()
            .collect())
    }

    async fn get_finality_update(&self) -> Result<LightClientFinalityUpdate<S>> {
        self.data
            .read()
            .finality_update
            .clone()
            .ok_or_else(|| RpcError::new("finality_update", "no finality update").into())
    }

    async fn get_optimistic_update(&self) -> Result<LightClientOptimisticUpdate<S>> {
        self.data
            .read()
            .optimistic_update
            .clone()
            .ok_or_else(|| RpcError::new("optimistic_update", "no optimistic update").into())
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}
