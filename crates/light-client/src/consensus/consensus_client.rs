use std::{sync::Arc, time::Duration};

use alloy_primitives::B256;
use anyhow::{anyhow, Result};
use beacon_types::{consensus::light_client::header::LightClientHeader, ConsensusSpec};
use futures::future::join;
use tracing::{debug, info, warn};
use tree_hash::TreeHash;

use super::{
    constants::MAX_REQUEST_LIGHT_CLIENT_UPDATES,
    errors::{ConsensusError, ErrorKind},
    processor::{LightClientProcessor, SharedLightClientProcessor},
    rpc::ConsensusRpc,
    types::UpdateOutcome,
    utils::calc_sync_period,
};
use crate::{
    config::client_config::Config,
    utils::{duration_until_next_update, expected_current_slot, is_checkpoint_fresh, unix_time},
    watch::LightClientWatchSenders,
};

// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/light-client.md

/// Drives a [`LightClientProcessor`] from a beacon light client API.
#[derive(Debug)]
pub struct ConsensusLightClient<R: ConsensusRpc<S>, S: ConsensusSpec> {
    rpc: R,
    processor: SharedLightClientProcessor<S>,
    watch_senders: Option<LightClientWatchSenders<S>>,
    initial_checkpoint: B256,
    pub last_checkpoint: Option<B256>,
}

impl<R: ConsensusRpc<S>, S: ConsensusSpec> ConsensusLightClient<R, S> {
    pub fn new(rpc: R, config: Arc<Config>) -> Result<Self> {
        let initial_checkpoint = config.trusted_block_root();
        let processor = LightClientProcessor::new(config)?.into_shared();
        Ok(Self {
            rpc,
            processor,
            watch_senders: None,
            initial_checkpoint,
            last_checkpoint: None,
        })
    }

    /// Publishes every accepted update on `senders`.
    pub fn with_watch_senders(mut self, senders: LightClientWatchSenders<S>) -> Self {
        self.watch_senders = Some(senders);
        self
    }

    pub fn processor(&self) -> SharedLightClientProcessor<S> {
        self.processor.clone()
    }

    pub fn get_header(&self) -> Option<LightClientHeader> {
        self.processor.lock().optimistic_header().cloned()
    }

    pub fn get_finalized_header(&self) -> Option<LightClientHeader> {
        self.processor.lock().finalized_header().cloned()
    }

    pub fn expected_current_slot(&self) -> u64 {
        let genesis_time = self.processor.lock().config().chain.genesis_time;
        expected_current_slot(unix_time(), genesis_time)
    }

    pub fn duration_until_next_update(&self) -> Duration {
        let genesis_time = self.processor.lock().config().chain.genesis_time;
        duration_until_next_update(unix_time(), genesis_time)
    }

    /// Bootstraps from the configured checkpoint and catches up to the current head.
    pub async fn sync(&mut self) -> Result<()> {
        self.bootstrap().await?;

        let bootstrap_period = self
            .processor
            .lock()
            .store()
            .map(|store| store.finalized_period())
            .ok_or(ConsensusError::Uninitialised)?;

        let updates = self
            .rpc
            .get_updates(bootstrap_period, MAX_REQUEST_LIGHT_CLIENT_UPDATES)
            .await?;
        for update in updates {
            let current_slot = self.expected_current_slot();
            let result = self
                .processor
                .lock()
                .process_update(update.clone(), current_slot);
            if self.check_outcome(result)?.is_some() {
                if let Some(senders) = &self.watch_senders {
                    senders.update.send_replace(Some(update));
                }
            }
        }

        self.advance_head().await?;

        info!(
            "Light client in sync with checkpoint: {}",
            self.initial_checkpoint
        );
        Ok(())
    }

    /// Pulls the latest finality and optimistic updates, and the next sync committee while it
    /// is unknown.
    pub async fn advance(&mut self) -> Result<()> {
        self.advance_head().await?;

        let current_period = {
            let processor = self.processor.lock();
            processor
                .store()
                .filter(|store| !store.is_next_sync_committee_known())
                .map(|store| calc_sync_period::<S>(store.finalized_slot()))
        };
        if let Some(current_period) = current_period {
            debug!("checking for sync committee update");
            let updates = self.rpc.get_updates(current_period, 1).await?;
            for update in updates {
                let current_slot = self.expected_current_slot();
                let result = self.processor.lock().process_update(update, current_slot);
                if let Err(err) = result {
                    debug!(error = %err, "Sync committee update not applied");
                }
            }
        }

        let current_slot = self.expected_current_slot();
        let result = self.processor.lock().process_force_update(current_slot);
        self.check_outcome(result)?;
        Ok(())
    }

    async fn advance_head(&mut self) -> Result<()> {
        let (finality_update, optimistic_update) = join(
            self.rpc.get_finality_update(),
            self.rpc.get_optimistic_update(),
        )
        .await;

        match finality_update {
            Ok(finality_update) => {
                let current_slot = self.expected_current_slot();
                let result = self
                    .processor
                    .lock()
                    .process_finality_update(finality_update.clone(), current_slot);
                if self.check_outcome(result)?.is_some() {
                    if let Some(senders) = &self.watch_senders {
                        senders.finality_update.send_replace(Some(finality_update));
                    }
                }
            }
            Err(err) => warn!("Could not fetch finality update: {err}"),
        }

        let optimistic_update = optimistic_update?;
        let current_slot = self.expected_current_slot();
        let result = self
            .processor
            .lock()
            .process_optimistic_update(optimistic_update.clone(), current_slot);
        if self.check_outcome(result)?.is_some() {
            if let Some(senders) = &self.watch_senders {
                senders
                    .optimistic_update
                    .send_replace(Some(optimistic_update));
            }
        }
        Ok(())
    }

    async fn bootstrap(&mut self) -> Result<()> {
        let bootstrap = self
            .rpc
            .get_bootstrap(self.initial_checkpoint)
            .await
            .map_err(|err| anyhow!("could not fetch bootstrap: {err}"))?;

        let current_slot = self.expected_current_slot();
        let checkpoint_slot = bootstrap.get_beacon_block_header().slot;
        let (max_checkpoint_age, strict_checkpoint_age) = {
            let processor = self.processor.lock();
            let config = processor.config();
            (config.max_checkpoint_age, config.strict_checkpoint_age)
        };
        if !is_checkpoint_fresh(checkpoint_slot, current_slot, max_checkpoint_age) {
            if strict_checkpoint_age {
                return Err(ConsensusError::CheckpointTooOld.into());
            } else {
                warn!("checkpoint too old, consider using a more recent block");
            }
        }

        self.processor
            .lock()
            .initialise_from_bootstrap(self.initial_checkpoint, bootstrap)?;
        Ok(())
    }

    /// Stale inputs are skipped; anything else stops the client. Returns the outcome of an
    /// accepted input.
    fn check_outcome(
        &mut self,
        result: Result<UpdateOutcome, ConsensusError>,
    ) -> Result<Option<UpdateOutcome>> {
        match result {
            Ok(outcome) => {
                if outcome.finalized_header_advanced {
                    self.record_checkpoint();
                }
                Ok(Some(outcome))
            }
            Err(err) if err.kind() == ErrorKind::Stale => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Epoch boundary blocks are usable as checkpoints for later bootstraps.
    fn record_checkpoint(&mut self) {
        let finalized = self
            .processor
            .lock()
            .finalized_header()
            .map(|header| header.beacon().clone());
        if let Some(beacon) = finalized {
            if beacon.slot % S::slots_per_epoch() == 0 {
                self.last_checkpoint = Some(beacon.tree_hash_root());
            }
        }
    }
}
