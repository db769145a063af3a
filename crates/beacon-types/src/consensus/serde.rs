use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serializer};

/// The beacon API renders `U256` values as decimal strings.
pub fn se_hex_to_number<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn de_number_to_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let result: String = Deserialize::deserialize(deserializer)?;
    U256::from_str_radix(&result, 10).map_err(serde::de::Error::custom)
}
