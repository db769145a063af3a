use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, Encode};
use tree_hash::{merkle_root, Hash256, PackedEncoding, TreeHash, TreeHashType};

use crate::utils::bytes::{hex_decode_fixed, hex_encode};

pub const SIGNATURE_BYTES_LEN: usize = 96;

/// Types based off specs @
/// https://github.com/ethereum/consensus-specs/blob/5970ae56a1/specs/phase0/beacon-chain.md
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BlsSignature {
    pub signature: [u8; SIGNATURE_BYTES_LEN],
}

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ssz::DecodeError> {
        let signature = bytes
            .try_into()
            .map_err(|_| ssz::DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: SIGNATURE_BYTES_LEN,
            })?;
        Ok(Self { signature })
    }
}

impl Default for BlsSignature {
    fn default() -> Self {
        Self {
            signature: [0u8; SIGNATURE_BYTES_LEN],
        }
    }
}

impl Decode for BlsSignature {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        SIGNATURE_BYTES_LEN
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, ssz::DecodeError> {
        Self::from_bytes(bytes)
    }
}

impl Encode for BlsSignature {
    fn is_ssz_fixed_len() -> bool {
        true
    }
    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.signature);
    }
    fn ssz_bytes_len(&self) -> usize {
        SIGNATURE_BYTES_LEN
    }
    fn ssz_fixed_len() -> usize {
        SIGNATURE_BYTES_LEN
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let result: String = Deserialize::deserialize(deserializer)?;
        let bytes = hex_decode_fixed::<SIGNATURE_BYTES_LEN>(&result).map_err(serde::de::Error::custom)?;
        Ok(Self { signature: bytes })
    }
}

impl Serialize for BlsSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let val = hex_encode(self.signature);
        serializer.serialize_str(&val)
    }
}

impl TreeHash for BlsSignature {
    fn tree_hash_type() -> tree_hash::TreeHashType {
        TreeHashType::Vector
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        PackedEncoding::from_vec(self.signature.to_vec())
    }

    fn tree_hash_packing_factor() -> usize {
        1
    }

    fn tree_hash_root(&self) -> Hash256 {
        merkle_root(&self.signature, 1)
    }
}
