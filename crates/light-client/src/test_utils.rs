//! Signed light client fixtures for tests.
//!
//! [`TestChain`] plays the part of a beacon node: it owns one deterministic sync committee
//! per period and produces bootstraps and updates whose proofs and signatures check out
//! against its configuration.

use std::sync::Arc;

use alloy_primitives::{B256, U256};
use beacon_types::{
    consensus::{
        constants::{
            CURRENT_SYNC_COMMITTEE_GINDEX, DOMAIN_SYNC_COMMITTEE, EXECUTION_PAYLOAD_GINDEX,
            FINALIZED_ROOT_GINDEX, NEXT_SYNC_COMMITTEE_GINDEX,
        },
        execution_payload::{
            upgrade_execution_payload_header_to_deneb, ExecutionPayloadHeaderCapella,
            ExecutionPayloadHeaderDeneb,
        },
        header::BeaconBlockHeader,
        pubkey::PubKey,
        signature::BlsSignature,
        sync_committee::{SyncAggregate, SyncCommittee},
    },
    light_client::{
        bootstrap::{
            LightClientBootstrap, LightClientBootstrapAltair, LightClientBootstrapCapella,
            LightClientBootstrapDeneb,
        },
        header::{
            ExecutionBranch, LightClientHeader, LightClientHeaderAltair,
            LightClientHeaderCapella, LightClientHeaderDeneb,
        },
        finality_update::{
            LightClientFinalityUpdate, LightClientFinalityUpdateAltair,
            LightClientFinalityUpdateCapella, LightClientFinalityUpdateDeneb,
        },
        optimistic_update::{
            LightClientOptimisticUpdate, LightClientOptimisticUpdateAltair,
            LightClientOptimisticUpdateCapella, LightClientOptimisticUpdateDeneb,
        },
        update::{
            LightClientUpdate, LightClientUpdateAltair, LightClientUpdateCapella,
            LightClientUpdateDeneb,
        },
    },
    merkle::{try_into_branch, zero_branch},
    test_utils::SparseMerkleTree,
    ConsensusSpec,
};
use milagro_bls::{AggregateSignature, PublicKey, SecretKey, Signature};
use ssz_types::FixedVector;
use tree_hash::TreeHash;

use crate::{
    config::client_config::Config,
    consensus::utils::{calc_sync_period, compute_domain, compute_signing_root},
};

/// A sync committee whose secret keys are known.
pub struct TestSigner<S: ConsensusSpec> {
    secret_keys: Vec<SecretKey>,
    committee: SyncCommittee<S>,
}

impl<S: ConsensusSpec> TestSigner<S> {
    /// Keys are derived from `seed` and the member index, so the same seed always yields the
    /// same committee.
    pub fn new(seed: u8) -> Self {
        let secret_keys: Vec<SecretKey> = (0..S::sync_committee_size())
            .map(|i| {
                let mut bytes = [0u8; 32];
                bytes[29] = seed;
                bytes[30..].copy_from_slice(&(i as u16 + 1).to_be_bytes());
                SecretKey::from_bytes(&bytes).expect("small non-zero scalars are valid keys")
            })
            .collect();
        let pubkeys = secret_keys
            .iter()
            .map(|secret_key| {
                PubKey::from_bytes(&PublicKey::from_secret_key(secret_key).as_bytes())
                    .expect("compressed public keys are 48 bytes")
            })
            .collect::<Vec<_>>();
        let committee = SyncCommittee {
            pubkeys: FixedVector::new(pubkeys).expect("one key per committee member"),
            aggregate_pubkey: PubKey::default(),
        };
        Self {
            secret_keys,
            committee,
        }
    }

    pub fn committee(&self) -> &SyncCommittee<S> {
        &self.committee
    }

    /// Signs `signing_root` with the first `participants` members.
    pub fn sign(&self, participants: usize, signing_root: B256) -> SyncAggregate<S> {
        let mut sync_aggregate = SyncAggregate::<S>::default();
        let mut signature = AggregateSignature::new();
        for (i, secret_key) in self.secret_keys.iter().take(participants).enumerate() {
            sync_aggregate
                .sync_committee_bits
                .set(i, true)
                .expect("participant index within committee");
            signature.add(&Signature::new(signing_root.as_slice(), secret_key));
        }
        sync_aggregate.sync_committee_signature = BlsSignature {
            signature: signature.as_bytes(),
        };
        sync_aggregate
    }
}

/// What a generated update attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateParams {
    pub attested_slot: u64,
    pub signature_slot: u64,
    /// `None` for an update without a finality proof.
    pub finalized_slot: Option<u64>,
    /// Whether to include the committee of the attested period's successor.
    pub with_next_sync_committee: bool,
    pub participants: usize,
}

impl UpdateParams {
    pub fn new(attested_slot: u64, signature_slot: u64) -> Self {
        Self {
            attested_slot,
            signature_slot,
            finalized_slot: None,
            with_next_sync_committee: false,
            participants: usize::MAX,
        }
    }

    pub fn finalized(mut self, finalized_slot: u64) -> Self {
        self.finalized_slot = Some(finalized_slot);
        self
    }

    pub fn with_next_sync_committee(mut self) -> Self {
        self.with_next_sync_committee = true;
        self
    }

    pub fn participants(mut self, participants: usize) -> Self {
        self.participants = participants;
        self
    }
}

/// A simulated chain with one sync committee per period.
pub struct TestChain<S: ConsensusSpec> {
    pub config: Arc<Config>,
    signers: Vec<TestSigner<S>>,
}

impl<S: ConsensusSpec> TestChain<S> {
    pub fn new(config: Config, periods: usize) -> Self {
        let signers = (0..periods)
            .map(|period| TestSigner::new(period as u8 + 1))
            .collect();
        Self {
            config: Arc::new(config),
            signers,
        }
    }

    pub fn signer(&self, period: u64) -> &TestSigner<S> {
        &self.signers[period as usize]
    }

    pub fn committee(&self, period: u64) -> &SyncCommittee<S> {
        self.signer(period).committee()
    }

    /// A header at `slot` in the schema of the fork active there, with a proven execution
    /// payload from Capella on.
    pub fn header(&self, slot: u64, state_root: B256) -> LightClientHeader {
        let beacon = BeaconBlockHeader {
            slot,
            proposer_index: slot % 64,
            parent_root: B256::from(U256::from(slot)),
            state_root,
            body_root: B256::ZERO,
        };
        let fork_name = self.config.fork_name_at_slot::<S>(slot);
        if !fork_name.has_light_client_execution() {
            return LightClientHeader::Altair(LightClientHeaderAltair { beacon });
        }

        let capella = ExecutionPayloadHeaderCapella {
            block_number: slot,
            block_hash: B256::from(U256::from(slot + 1)),
            gas_limit: 30_000_000,
            timestamp: self.config.chain.genesis_time + slot * 12,
            ..Default::default()
        };
        if fork_name.has_blob_gas() {
            let execution = ExecutionPayloadHeaderDeneb {
                blob_gas_used: 131_072,
                ..upgrade_execution_payload_header_to_deneb(&capella)
            };
            let (body_root, execution_branch) = body_with_execution(execution.tree_hash_root());
            LightClientHeader::Deneb(LightClientHeaderDeneb {
                beacon: BeaconBlockHeader { body_root, ..beacon },
                execution,
                execution_branch,
            })
        } else {
            let (body_root, execution_branch) = body_with_execution(capella.tree_hash_root());
            LightClientHeader::Capella(LightClientHeaderCapella {
                beacon: BeaconBlockHeader { body_root, ..beacon },
                execution: capella,
                execution_branch,
            })
        }
    }

    fn state(&self, slot: u64) -> SparseMerkleTree {
        let period = calc_sync_period::<S>(slot);
        let mut state = SparseMerkleTree::default();
        state.insert(
            CURRENT_SYNC_COMMITTEE_GINDEX,
            self.committee(period).tree_hash_root(),
        );
        state
    }

    /// A bootstrap at `slot` and the block root it is anchored to.
    pub fn bootstrap(&self, slot: u64) -> (B256, LightClientBootstrap<S>) {
        let state = self.state(slot);
        let header = self.header(slot, state.root());
        let current_sync_committee = self.committee(calc_sync_period::<S>(slot)).clone();
        let current_sync_committee_branch =
            try_into_branch(state.branch(CURRENT_SYNC_COMMITTEE_GINDEX))
                .expect("sync committee branch depth");

        let block_root = header.beacon().tree_hash_root();
        let bootstrap = match header {
            LightClientHeader::Altair(header) => {
                LightClientBootstrap::Altair(LightClientBootstrapAltair {
                    header,
                    current_sync_committee,
                    current_sync_committee_branch,
                })
            }
            LightClientHeader::Capella(header) => {
                LightClientBootstrap::Capella(LightClientBootstrapCapella {
                    header,
                    current_sync_committee,
                    current_sync_committee_branch,
                })
            }
            LightClientHeader::Deneb(header) => {
                LightClientBootstrap::Deneb(LightClientBootstrapDeneb {
                    header,
                    current_sync_committee,
                    current_sync_committee_branch,
                })
            }
        };
        (block_root, bootstrap)
    }

    /// A signed update. The signature comes from the committee of the signature slot's
    /// period; the next sync committee, if included, is the committee of the period after
    /// the attested slot.
    pub fn update(&self, params: UpdateParams) -> LightClientUpdate<S> {
        let attested_period = calc_sync_period::<S>(params.attested_slot);
        let mut state = self.state(params.attested_slot);

        let finalized_header = params.finalized_slot.map(|finalized_slot| {
            let finalized_state = self.state(finalized_slot);
            self.header(finalized_slot, finalized_state.root())
        });
        if let Some(finalized_header) = &finalized_header {
            state.insert(FINALIZED_ROOT_GINDEX, finalized_header.beacon().tree_hash_root());
        }
        let next_sync_committee = params
            .with_next_sync_committee
            .then(|| self.committee(attested_period + 1).clone());
        if let Some(next_sync_committee) = &next_sync_committee {
            state.insert(NEXT_SYNC_COMMITTEE_GINDEX, next_sync_committee.tree_hash_root());
        }

        let attested_header = self.header(params.attested_slot, state.root());
        let fork_name = attested_header.fork_name();
        let finality_branch = match finalized_header {
            Some(_) => try_into_branch(state.branch(FINALIZED_ROOT_GINDEX))
                .expect("finality branch depth"),
            None => zero_branch(),
        };
        let next_sync_committee_branch = match next_sync_committee {
            Some(_) => try_into_branch(state.branch(NEXT_SYNC_COMMITTEE_GINDEX))
                .expect("next sync committee branch depth"),
            None => zero_branch(),
        };
        let finalized_header = match finalized_header {
            Some(header) => header
                .upgrade_to(fork_name)
                .expect("finalized header is not newer than the attested header"),
            None => LightClientHeader::empty(fork_name).expect("light client fork"),
        };
        let next_sync_committee = next_sync_committee.unwrap_or_default();

        let signature_period = calc_sync_period::<S>(params.signature_slot);
        let fork_version = self
            .config
            .fork_version::<S>(params.signature_slot.max(1) - 1);
        let domain = compute_domain(
            DOMAIN_SYNC_COMMITTEE,
            fork_version.0,
            self.config.chain.genesis_root,
        );
        let signing_root = compute_signing_root(attested_header.beacon().tree_hash_root(), domain);
        let sync_aggregate = self
            .signer(signature_period)
            .sign(params.participants, signing_root);
        let signature_slot = params.signature_slot;

        match (attested_header, finalized_header) {
            (
                LightClientHeader::Altair(attested_header),
                LightClientHeader::Altair(finalized_header),
            ) => {
                LightClientUpdate::Altair(LightClientUpdateAltair {
                    attested_header,
                    next_sync_committee,
                    next_sync_committee_branch,
                    finalized_header,
                    finality_branch,
                    sync_aggregate,
                    signature_slot,
                })
            }
            (
                LightClientHeader::Capella(attested_header),
                LightClientHeader::Capella(finalized_header),
            ) => {
                LightClientUpdate::Capella(LightClientUpdateCapella {
                    attested_header,
                    next_sync_committee,
                    next_sync_committee_branch,
                    finalized_header,
                    finality_branch,
                    sync_aggregate,
                    signature_slot,
                })
            }
            (
                LightClientHeader::Deneb(attested_header),
                LightClientHeader::Deneb(finalized_header),
            ) => {
                LightClientUpdate::Deneb(LightClientUpdateDeneb {
                    attested_header,
                    next_sync_committee,
                    next_sync_committee_branch,
                    finalized_header,
                    finality_branch,
                    sync_aggregate,
                    signature_slot,
                })
            }
            _ => unreachable!("finalized header was upgraded to the attested header's fork"),
        }
    }

    /// A signed finality update. `params` must carry a finalized slot.
    pub fn finality_update(&self, params: UpdateParams) -> LightClientFinalityUpdate<S> {
        assert!(params.finalized_slot.is_some(), "finality update without finalized slot");
        let params = UpdateParams {
            with_next_sync_committee: false,
            ..params
        };
        match self.update(params) {
            LightClientUpdate::Altair(update) => {
                LightClientFinalityUpdate::Altair(LightClientFinalityUpdateAltair {
                    attested_header: update.attested_header,
                    finalized_header: update.finalized_header,
                    finality_branch: update.finality_branch,
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
            LightClientUpdate::Capella(update) => {
                LightClientFinalityUpdate::Capella(LightClientFinalityUpdateCapella {
                    attested_header: update.attested_header,
                    finalized_header: update.finalized_header,
                    finality_branch: update.finality_branch,
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
            LightClientUpdate::Deneb(update) => {
                LightClientFinalityUpdate::Deneb(LightClientFinalityUpdateDeneb {
                    attested_header: update.attested_header,
                    finalized_header: update.finalized_header,
                    finality_branch: update.finality_branch,
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
        }
    }

    /// A signed optimistic update for the header at `params.attested_slot`.
    pub fn optimistic_update(&self, params: UpdateParams) -> LightClientOptimisticUpdate<S> {
        let params = UpdateParams {
            finalized_slot: None,
            with_next_sync_committee: false,
            ..params
        };
        match self.update(params) {
            LightClientUpdate::Altair(update) => {
                LightClientOptimisticUpdate::Altair(LightClientOptimisticUpdateAltair {
                    attested_header: update.attested_header,
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
            LightClientUpdate::Capella(update) => {
                LightClientOptimisticUpdate::Capella(LightClientOptimisticUpdateCapella {
                    attested_header: update.attested_header,
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
            LightClientUpdate::Deneb(update) => {
                LightClientOptimisticUpdate::Deneb(LightClientOptimisticUpdateDeneb {
                    attested_header: update.attested_header,
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
        }
    }
}

/// A block body whose only non-zero field is the execution payload header.
fn body_with_execution(execution_root: B256) -> (B256, ExecutionBranch) {
    let body = SparseMerkleTree::with_leaves(&[(EXECUTION_PAYLOAD_GINDEX, execution_root)]);
    let branch =
        try_into_branch(body.branch(EXECUTION_PAYLOAD_GINDEX)).expect("execution branch depth");
    (body.root(), branch)
}
