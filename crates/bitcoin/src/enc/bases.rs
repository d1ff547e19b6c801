//! Contains simplified access to `bech32` and base58check encoder/decoder
//! for Bitcoin addresses. Also re-exports common encoder errors.

pub use txforge_core::enc::{decode_base58, encode_base58, EncodingError, EncodingResult};

use txforge_core::enc;

/// Encode a byte vector to bech32. This function expects `v` to be a witness
/// program, and will return an `UnknownScriptType` if it does not meet the
/// witness program format.
pub fn encode_bech32(hrp: &str, v: &[u8]) -> EncodingResult<String> {
    if v.len() < 2 || v.len() > 40 {
        return Err(bech32::Error::InvalidLength.into());
    }

    let (version_and_len, payload) = v.split_at(2);
    if version_and_len[0] > 16 || version_and_len[1] as usize != payload.len() {
        return Err(EncodingError::UnknownScriptType);
    };

    enc::encode_bech32(hrp, version_and_len[0], payload)
}

/// Decode a witness program from a bech32 string. Caller specifies an
/// expected HRP. If a different HRP is found, returns `WrongHrp`.
pub fn decode_bech32(expected_hrp: &str, s: &str) -> EncodingResult<Vec<u8>> {
    let (version, data) = enc::decode_bech32(expected_hrp, s)?;

    // Encode as witness program: witness version, then len(payload), then
    // the payload itself.
    let mut program: Vec<u8> = vec![version, data.len() as u8];
    program.extend(&data);

    Ok(program)
}
