use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, Encode};
use ssz_types::{typenum, FixedVector};
use tree_hash_derive::TreeHash;

use crate::utils::bytes::{hex_decode_fixed, hex_encode};

pub const PUBKEY_BYTES_LEN: usize = 48;

/// Compressed BLS public key.
///
/// https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#custom-types
#[derive(Debug, PartialEq, Eq, Clone, TreeHash)]
pub struct PubKey {
    pub inner: FixedVector<u8, typenum::U48>,
}

impl PubKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ssz::DecodeError> {
        if bytes.len() != PUBKEY_BYTES_LEN {
            return Err(ssz::DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: PUBKEY_BYTES_LEN,
            });
        }
        Ok(Self {
            inner: FixedVector::from(bytes.to_vec()),
        })
    }
}

impl Default for PubKey {
    fn default() -> Self {
        Self {
            inner: FixedVector::from_elem(0),
        }
    }
}

impl Deref for PubKey {
    type Target = FixedVector<u8, typenum::U48>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Decode for PubKey {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        PUBKEY_BYTES_LEN
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, ssz::DecodeError> {
        Self::from_bytes(bytes)
    }
}

impl Encode for PubKey {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.inner);
    }

    fn ssz_bytes_len(&self) -> usize {
        PUBKEY_BYTES_LEN
    }

    fn ssz_fixed_len() -> usize {
        PUBKEY_BYTES_LEN
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let result: String = Deserialize::deserialize(deserializer)?;
        let bytes = hex_decode_fixed::<PUBKEY_BYTES_LEN>(&result).map_err(serde::de::Error::custom)?;
        Ok(Self {
            inner: FixedVector::from(bytes.to_vec()),
        })
    }
}

impl Serialize for PubKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex_encode(&self.inner[..]))
    }
}
