//! Simplified access to `bech32` and base58check encoding for UTXO-chain
//! addresses. Also defines common encoder errors.

use bech32::{FromBase32, ToBase32, Variant};
use thiserror::Error;

/// Errors related to address encoding and decoding.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Bech32 encode/decode error bubbled up from the `bech32` crate.
    #[error(transparent)]
    Bech32Error(#[from] bech32::Error),

    /// Base58check decode error bubbled up from the `bs58` crate.
    #[error(transparent)]
    Base58Error(#[from] bs58::decode::Error),

    /// The bech32 HRP did not match the expected network HRP.
    #[error("Wrong HRP. Expected {expected}, got {got}")]
    WrongHrp {
        /// The HRP the decoder expected.
        expected: String,
        /// The HRP found in the string.
        got: String,
    },

    /// The base58check version byte did not match the expected network byte.
    #[error("Wrong version byte. Expected {expected:x}, got {got:x}")]
    WrongVersion {
        /// The version byte the decoder expected.
        expected: u8,
        /// The version byte found in the payload.
        got: u8,
    },

    /// The script was not a recognized standard type and cannot be encoded
    /// as an address.
    #[error("Unknown script type")]
    UnknownScriptType,
}

/// Type alias for encoding errors
pub type EncodingResult<T> = Result<T, EncodingError>;

/// Encode a payload as base58check with a leading version byte.
pub fn encode_base58(version: u8, payload: &[u8]) -> String {
    bs58::encode(payload)
        .with_check_version(version)
        .into_string()
}

/// Decode a base58check string, checking the leading version byte. Returns
/// the payload without the version byte.
pub fn decode_base58(expected_version: u8, s: &str) -> EncodingResult<Vec<u8>> {
    let data = bs58::decode(s)
        .with_check(Some(expected_version))
        .into_vec()?;
    Ok(data[1..].to_vec())
}

/// Encode a witness program as bech32. The `version` is the witness version,
/// the `payload` is the program itself.
pub fn encode_bech32(hrp: &str, version: u8, payload: &[u8]) -> EncodingResult<String> {
    let mut data = vec![bech32::u5::try_from_u8(version)?];
    data.extend(payload.to_base32());
    Ok(bech32::encode(hrp, data, Variant::Bech32)?)
}

/// Decode a bech32 string into a witness version and program payload. The
/// caller specifies the expected HRP; if a different HRP is found, returns
/// `WrongHrp`.
pub fn decode_bech32(expected_hrp: &str, s: &str) -> EncodingResult<(u8, Vec<u8>)> {
    let (hrp, data, _variant) = bech32::decode(s)?;
    if hrp != expected_hrp {
        return Err(EncodingError::WrongHrp {
            expected: expected_hrp.to_owned(),
            got: hrp,
        });
    }
    if data.is_empty() {
        return Err(bech32::Error::InvalidLength.into());
    }
    let version = data[0].to_u8();
    let payload = Vec::<u8>::from_base32(&data[1..])?;
    Ok((version, payload))
}
