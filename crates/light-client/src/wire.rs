//! Adapters between network payloads and light client messages.
//!
//! Every light client payload travels with the 4-byte fork digest of the fork active at the
//! message's slot. The digest selects the SSZ schema the payload is decoded with.

use std::collections::HashMap;

use alloy_primitives::B256;
use beacon_types::{
    consensus::fork::{compute_fork_digest, ForkDigest, ForkName, FORK_DIGEST_LEN},
    light_client::{
        bootstrap::LightClientBootstrap, finality_update::LightClientFinalityUpdate,
        optimistic_update::LightClientOptimisticUpdate, update::LightClientUpdate,
    },
    ConsensusSpec,
};
use ssz::Encode;
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::config::Forks;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("context bytes must be {FORK_DIGEST_LEN} bytes, got {0}")]
    InvalidContextBytes(usize),
    #[error("unknown fork digest: 0x{0}")]
    UnknownForkDigest(String),
    #[error("fork {0} has no light client data")]
    UnsupportedFork(ForkName),
    #[error("failed to decode {kind} for fork {fork_name}: {message}")]
    Decode {
        kind: MessageKind,
        fork_name: ForkName,
        message: String,
    },
    #[error("{kind} encoded for {schema} cannot be sent under fork {fork_name}")]
    SchemaMismatch {
        kind: MessageKind,
        schema: ForkName,
        fork_name: ForkName,
    },
}

/// Maps fork digests to the fork they identify, and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkDigests {
    by_digest: HashMap<ForkDigest, ForkName>,
    by_fork: HashMap<ForkName, ForkDigest>,
}

impl ForkDigests {
    pub fn new(forks: &Forks, genesis_validators_root: B256) -> Self {
        let mut by_digest = HashMap::new();
        let mut by_fork = HashMap::new();
        for fork_name in ForkName::ALL {
            let digest =
                compute_fork_digest(forks.get(fork_name).fork_version.0, genesis_validators_root);
            by_digest.insert(digest, fork_name);
            by_fork.insert(fork_name, digest);
        }
        Self { by_digest, by_fork }
    }

    pub fn fork_name(&self, digest: &ForkDigest) -> Option<ForkName> {
        self.by_digest.get(digest).copied()
    }

    pub fn digest(&self, fork_name: ForkName) -> Option<ForkDigest> {
        self.by_fork.get(&fork_name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    Bootstrap,
    Update,
    FinalityUpdate,
    OptimisticUpdate,
}

impl MessageKind {
    /// Req/resp protocol id serving this message.
    pub fn protocol_id(&self) -> &'static str {
        match self {
            Self::Bootstrap => "/eth2/beacon_chain/req/light_client_bootstrap/1/ssz_snappy",
            Self::Update => "/eth2/beacon_chain/req/light_client_updates_by_range/1/ssz_snappy",
            Self::FinalityUpdate => {
                "/eth2/beacon_chain/req/light_client_finality_update/1/ssz_snappy"
            }
            Self::OptimisticUpdate => {
                "/eth2/beacon_chain/req/light_client_optimistic_update/1/ssz_snappy"
            }
        }
    }

    /// Gossip topic for this message under `fork_digest`. Only finality and optimistic
    /// updates are gossiped.
    pub fn gossip_topic(&self, fork_digest: ForkDigest) -> Option<String> {
        let name = match self {
            Self::Bootstrap | Self::Update => return None,
            Self::FinalityUpdate => "light_client_finality_update",
            Self::OptimisticUpdate => "light_client_optimistic_update",
        };
        Some(format!("/eth2/{}/{name}/ssz_snappy", hex::encode(fork_digest)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightClientMessage<S: ConsensusSpec> {
    Bootstrap(LightClientBootstrap<S>),
    Update(LightClientUpdate<S>),
    FinalityUpdate(LightClientFinalityUpdate<S>),
    OptimisticUpdate(LightClientOptimisticUpdate<S>),
}

impl<S: ConsensusSpec> LightClientMessage<S> {
    /// Decodes `payload` with the schema selected by `context_bytes`.
    pub fn decode(
        kind: MessageKind,
        context_bytes: &[u8],
        payload: &[u8],
        fork_digests: &ForkDigests,
    ) -> Result<Self, ProtocolError> {
        let digest: ForkDigest = context_bytes
            .try_into()
            .map_err(|_| ProtocolError::InvalidContextBytes(context_bytes.len()))?;
        let fork_name = fork_digests
            .fork_name(&digest)
            .ok_or_else(|| ProtocolError::UnknownForkDigest(hex::encode(digest)))?;
        if !fork_name.has_light_client() {
            return Err(ProtocolError::UnsupportedFork(fork_name));
        }

        let decoded = match kind {
            MessageKind::Bootstrap => {
                LightClientBootstrap::from_ssz_bytes(payload, fork_name).map(Self::Bootstrap)
            }
            MessageKind::Update => {
                LightClientUpdate::from_ssz_bytes(payload, fork_name).map(Self::Update)
            }
            MessageKind::FinalityUpdate => {
                LightClientFinalityUpdate::from_ssz_bytes(payload, fork_name)
                    .map(Self::FinalityUpdate)
            }
            MessageKind::OptimisticUpdate => {
                LightClientOptimisticUpdate::from_ssz_bytes(payload, fork_name)
                    .map(Self::OptimisticUpdate)
            }
        };
        decoded.map_err(|err| ProtocolError::Decode {
            kind,
            fork_name,
            message: format!("{err:?}"),
        })
    }

    /// Encodes the message as `(context_bytes, payload)` for sending while `fork_name` is
    /// active at the message's slot.
    pub fn encode(
        &self,
        fork_name: ForkName,
        fork_digests: &ForkDigests,
    ) -> Result<(ForkDigest, Vec<u8>), ProtocolError> {
        let schema = self.fork_name();
        if fork_name.light_client_fork() != Some(schema) {
            return Err(ProtocolError::SchemaMismatch {
                kind: self.kind(),
                schema,
                fork_name,
            });
        }
        let digest = fork_digests
            .digest(fork_name)
            .ok_or(ProtocolError::UnsupportedFork(fork_name))?;
        let payload = match self {
            Self::Bootstrap(bootstrap) => bootstrap.as_ssz_bytes(),
            Self::Update(update) => update.as_ssz_bytes(),
            Self::FinalityUpdate(update) => update.as_ssz_bytes(),
            Self::OptimisticUpdate(update) => update.as_ssz_bytes(),
        };
        Ok((digest, payload))
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Bootstrap(_) => MessageKind::Bootstrap,
            Self::Update(_) => MessageKind::Update,
            Self::FinalityUpdate(_) => MessageKind::FinalityUpdate,
            Self::OptimisticUpdate(_) => MessageKind::OptimisticUpdate,
        }
    }

    /// The light client fork whose schema the message uses.
    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Bootstrap(bootstrap) => bootstrap.fork_name(),
            Self::Update(update) => update.fork_name(),
            Self::FinalityUpdate(update) => update.fork_name(),
            Self::OptimisticUpdate(update) => update.fork_name(),
        }
    }

    /// The slot that determines the message's fork: the bootstrap header or the attested
    /// header.
    pub fn slot(&self) -> u64 {
        match self {
            Self::Bootstrap(bootstrap) => bootstrap.get_beacon_block_header().slot,
            Self::Update(update) => update.attested_slot(),
            Self::FinalityUpdate(update) => update.attested_header().slot(),
            Self::OptimisticUpdate(update) => update.attested_header().slot(),
        }
    }
}
