use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_this_or_that::as_u64;
use ssz::Decode;
use ssz_derive::{Decode, Encode};
use ssz_types::{
    serde_utils::{hex_fixed_vec, hex_var_list},
    typenum, FixedVector, VariableList,
};
use superstruct::superstruct;
use tree_hash_derive::TreeHash;

use crate::consensus::{
    fork::{ForkName, UpgradeError},
    serde::{de_number_to_u256, se_hex_to_number},
};

pub type Bloom = FixedVector<u8, typenum::U256>;
pub type ExtraData = VariableList<u8, typenum::U32>;

/// Summary of the execution block carried by a beacon block, as embedded in light client
/// headers from Capella on.
///
/// https://github.com/ethereum/consensus-specs/blob/dev/specs/deneb/beacon-chain.md#executionpayloadheader
#[superstruct(
    variants(Bellatrix, Capella, Deneb),
    variant_attributes(
        derive(
            Default,
            Debug,
            Clone,
            PartialEq,
            Serialize,
            Deserialize,
            Encode,
            Decode,
            TreeHash
        ),
        serde(deny_unknown_fields),
    )
)]
#[derive(Debug, Clone, PartialEq, Serialize, Encode, TreeHash)]
#[serde(untagged)]
#[ssz(enum_behaviour = "transparent")]
#[tree_hash(enum_behaviour = "transparent")]
pub struct ExecutionPayloadHeader {
    #[superstruct(getter(copy))]
    pub parent_hash: B256,
    #[superstruct(getter(copy))]
    pub fee_recipient: Address,
    #[superstruct(getter(copy))]
    pub state_root: B256,
    #[superstruct(getter(copy))]
    pub receipts_root: B256,
    #[serde(with = "hex_fixed_vec")]
    pub logs_bloom: Bloom,
    #[superstruct(getter(copy))]
    pub prev_randao: B256,
    #[superstruct(getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub block_number: u64,
    #[superstruct(getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub gas_limit: u64,
    #[superstruct(getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub gas_used: u64,
    #[superstruct(getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub timestamp: u64,
    #[serde(with = "hex_var_list")]
    pub extra_data: ExtraData,
    #[superstruct(getter(copy))]
    #[serde(deserialize_with = "de_number_to_u256")]
    #[serde(serialize_with = "se_hex_to_number")]
    pub base_fee_per_gas: U256,
    #[superstruct(getter(copy))]
    pub block_hash: B256,
    #[superstruct(getter(copy))]
    pub transactions_root: B256,
    #[superstruct(only(Capella, Deneb), partial_getter(copy))]
    pub withdrawals_root: B256,
    #[superstruct(only(Deneb), partial_getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub blob_gas_used: u64,
    #[superstruct(only(Deneb), partial_getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub excess_blob_gas: u64,
}

impl ExecutionPayloadHeader {
    pub fn from_ssz_bytes(bytes: &[u8], fork_name: ForkName) -> Result<Self, ssz::DecodeError> {
        match fork_name {
            ForkName::Bellatrix => {
                ExecutionPayloadHeaderBellatrix::from_ssz_bytes(bytes).map(Self::Bellatrix)
            }
            ForkName::Capella => {
                ExecutionPayloadHeaderCapella::from_ssz_bytes(bytes).map(Self::Capella)
            }
            ForkName::Deneb => ExecutionPayloadHeaderDeneb::from_ssz_bytes(bytes).map(Self::Deneb),
            ForkName::Phase0 | ForkName::Altair => Err(ssz::DecodeError::BytesInvalid(format!(
                "no execution payload before bellatrix, got {fork_name}"
            ))),
        }
    }

    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Bellatrix(_) => ForkName::Bellatrix,
            Self::Capella(_) => ForkName::Capella,
            Self::Deneb(_) => ForkName::Deneb,
        }
    }

    /// Moves the header forward to the schema of `fork_name`, one fork at a time.
    pub fn upgrade_to(self, fork_name: ForkName) -> Result<Self, UpgradeError> {
        let from = self.fork_name();
        if fork_name < from {
            return Err(UpgradeError::Downgrade {
                from,
                to: fork_name,
            });
        }
        let mut header = self;
        loop {
            if header.fork_name() >= fork_name {
                return Ok(header);
            }
            header = match header {
                Self::Bellatrix(inner) => {
                    Self::Capella(upgrade_execution_payload_header_to_capella(&inner))
                }
                Self::Capella(inner) => {
                    Self::Deneb(upgrade_execution_payload_header_to_deneb(&inner))
                }
                Self::Deneb(inner) => return Ok(Self::Deneb(inner)),
            };
        }
    }
}

/// Capella adds `withdrawals_root`, which is zero for a header that predates withdrawals.
pub fn upgrade_execution_payload_header_to_capella(
    pre: &ExecutionPayloadHeaderBellatrix,
) -> ExecutionPayloadHeaderCapella {
    ExecutionPayloadHeaderCapella {
        parent_hash: pre.parent_hash,
        fee_recipient: pre.fee_recipient,
        state_root: pre.state_root,
        receipts_root: pre.receipts_root,
        logs_bloom: pre.logs_bloom.clone(),
        prev_randao: pre.prev_randao,
        block_number: pre.block_number,
        gas_limit: pre.gas_limit,
        gas_used: pre.gas_used,
        timestamp: pre.timestamp,
        extra_data: pre.extra_data.clone(),
        base_fee_per_gas: pre.base_fee_per_gas,
        block_hash: pre.block_hash,
        transactions_root: pre.transactions_root,
        withdrawals_root: B256::ZERO,
    }
}

/// Deneb adds the blob gas counters, both zero before blobs existed.
pub fn upgrade_execution_payload_header_to_deneb(
    pre: &ExecutionPayloadHeaderCapella,
) -> ExecutionPayloadHeaderDeneb {
    ExecutionPayloadHeaderDeneb {
        parent_hash: pre.parent_hash,
        fee_recipient: pre.fee_recipient,
        state_root: pre.state_root,
        receipts_root: pre.receipts_root,
        logs_bloom: pre.logs_bloom.clone(),
        prev_randao: pre.prev_randao,
        block_number: pre.block_number,
        gas_limit: pre.gas_limit,
        gas_used: pre.gas_used,
        timestamp: pre.timestamp,
        extra_data: pre.extra_data.clone(),
        base_fee_per_gas: pre.base_fee_per_gas,
        block_hash: pre.block_hash,
        transactions_root: pre.transactions_root,
        withdrawals_root: pre.withdrawals_root,
        blob_gas_used: 0,
        excess_blob_gas: 0,
    }
}

impl ExecutionPayloadHeaderDeneb {
    /// The same header in Capella shape, used to merkleize a Deneb-schema header whose block
    /// was produced before Deneb activated.
    pub fn to_capella(&self) -> ExecutionPayloadHeaderCapella {
        ExecutionPayloadHeaderCapella {
            parent_hash: self.parent_hash,
            fee_recipient: self.fee_recipient,
            state_root: self.state_root,
            receipts_root: self.receipts_root,
            logs_bloom: self.logs_bloom.clone(),
            prev_randao: self.prev_randao,
            block_number: self.block_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            base_fee_per_gas: self.base_fee_per_gas,
            block_hash: self.block_hash,
            transactions_root: self.transactions_root,
            withdrawals_root: self.withdrawals_root,
        }
    }
}
