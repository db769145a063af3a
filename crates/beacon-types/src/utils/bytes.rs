use thiserror::Error;

/// A error related to hexadecimal string encoding and decoding.
#[derive(Error, Debug, PartialEq)]
pub enum HexError {
    /// A failure to convert a string into a byte vector.
    #[error("Could not decode hex")]
    DecodeError(#[from] hex::FromHexError),
    /// A failure to adhere to the convention that a hex-encoded
    /// string must include the "0x" prefix.
    #[error("Hex strings must start with 0x, but found {0}")]
    PrefixError(String),
    /// The decoded bytes do not have the length the target type requires.
    #[error("Expected {expected} bytes, but found {actual}")]
    LengthError { expected: usize, actual: usize },
}

/// Encode hex with 0x prefix
pub fn hex_encode<T: AsRef<[u8]>>(data: T) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decode hex with 0x prefix
pub fn hex_decode(data: &str) -> Result<Vec<u8>, HexError> {
    match data.strip_prefix("0x") {
        Some(stripped) => Ok(hex::decode(stripped)?),
        None => Err(HexError::PrefixError(data.chars().take(2).collect())),
    }
}

/// Decode a 0x-prefixed hex string into exactly `N` bytes.
pub fn hex_decode_fixed<const N: usize>(data: &str) -> Result<[u8; N], HexError> {
    let bytes = hex_decode(data)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| HexError::LengthError {
        expected: N,
        actual: bytes.len(),
    })
}

/// Returns a compact hex-encoded `String` representation of `data`.
pub fn hex_encode_compact<T: AsRef<[u8]>>(data: T) -> String {
    if data.as_ref().len() <= 8 {
        hex_encode(data)
    } else {
        let hex = hex::encode(data);
        format!("0x{}..{}", &hex[0..4], &hex[hex.len() - 4..])
    }
}
