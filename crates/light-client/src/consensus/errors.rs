use beacon_types::consensus::fork::{ForkName, UpgradeError};
use thiserror::Error;

/// Coarse classification of a rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    /// The input does not follow the rules of its own schema.
    Malformed,
    /// The input is well formed but its proofs or signature do not check out.
    TrustViolation,
    /// The input is valid but carries nothing new for the store.
    Stale,
    /// The store has not been bootstrapped.
    Uninitialised,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConsensusError {
    #[error("insufficient participation: {participants} < {required}")]
    InsufficientParticipation { participants: u64, required: u64 },
    #[error("invalid light client header at slot {0}")]
    InvalidHeader(u64),
    #[error("signature slot {signature_slot} is ahead of the current slot {current_slot}")]
    FutureSignatureSlot {
        signature_slot: u64,
        current_slot: u64,
    },
    #[error("invalid slot order: signature {signature_slot}, attested {attested_slot}, finalized {finalized_slot}")]
    InvalidSlotOrder {
        signature_slot: u64,
        attested_slot: u64,
        finalized_slot: u64,
    },
    #[error("invalid period: signature period {signature_period}, store period {store_period}")]
    InvalidPeriod {
        signature_period: u64,
        store_period: u64,
    },
    #[error("update not relevant")]
    NotRelevant,
    #[error("finalized header present without a finality proof")]
    UnexpectedFinalizedHeader,
    #[error("invalid finality proof")]
    InvalidFinalityProof,
    #[error("next sync committee present without a proof")]
    UnexpectedNextSyncCommittee,
    #[error("next sync committee does not match the known one")]
    NextSyncCommitteeMismatch,
    #[error("invalid next sync committee proof")]
    InvalidNextSyncCommitteeProof,
    #[error("invalid current sync committee proof")]
    InvalidCurrentSyncCommitteeProof,
    #[error("invalid sync committee public key at index {0}")]
    InvalidPublicKey(usize),
    #[error("invalid sync committee signature")]
    InvalidSignature,
    #[error("invalid header hash found: {1}, expected: {0}")]
    InvalidHeaderHash(String, String),
    #[error("checkpoint is too old")]
    CheckpointTooOld,
    #[error("store already bootstrapped, initialise explicitly to reset")]
    AlreadyBootstrapped,
    #[error("light client store is not bootstrapped")]
    Uninitialised,
    #[error("configured preset {configured} does not match {expected}")]
    PresetMismatch {
        configured: String,
        expected: &'static str,
    },
    #[error("fork {0} has no light client data")]
    UnsupportedFork(ForkName),
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedFinalizedHeader
            | Self::UnexpectedNextSyncCommittee
            | Self::InvalidPublicKey(_)
            | Self::PresetMismatch { .. }
            | Self::UnsupportedFork(_)
            | Self::Upgrade(_) => ErrorKind::Malformed,
            Self::InsufficientParticipation { .. }
            | Self::InvalidHeader(_)
            | Self::InvalidFinalityProof
            | Self::NextSyncCommitteeMismatch
            | Self::InvalidNextSyncCommitteeProof
            | Self::InvalidCurrentSyncCommitteeProof
            | Self::InvalidSignature
            | Self::InvalidHeaderHash(..) => ErrorKind::TrustViolation,
            Self::FutureSignatureSlot { .. }
            | Self::InvalidSlotOrder { .. }
            | Self::InvalidPeriod { .. }
            | Self::NotRelevant
            | Self::CheckpointTooOld
            | Self::AlreadyBootstrapped => ErrorKind::Stale,
            Self::Uninitialised => ErrorKind::Uninitialised,
        }
    }

    pub fn is_trust_violation(&self) -> bool {
        self.kind() == ErrorKind::TrustViolation
    }
}
