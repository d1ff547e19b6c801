//! Defines parameterized Bitcoin address encoders for Mainnet and Testnet.

use std::marker::PhantomData;

use crate::{
    enc::bases::{
        decode_base58, decode_bech32, encode_base58, encode_bech32, EncodingError, EncodingResult,
    },
    types::script::{ScriptPubkey, ScriptType},
};

/// The available Bitcoin Address types, implemented as a type enum around
/// strings.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Clone, Debug)]
pub enum Address {
    /// Legacy Pay to Pubkeyhash
    PKH(String),
    /// Legacy Pay to Scripthash
    SH(String),
    /// Witness Pay to Pubkeyhash
    WPKH(String),
    /// Witness Pay to Scripthash
    WSH(String),
}

impl Address {
    /// Get a clone of the string underlying the address type.
    pub fn as_string(&self) -> String {
        match &self {
            Address::PKH(s) => s.clone(),
            Address::SH(s) => s.clone(),
            Address::WPKH(s) => s.clone(),
            Address::WSH(s) => s.clone(),
        }
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        match &self {
            Address::PKH(s) => s,
            Address::SH(s) => s,
            Address::WPKH(s) => s,
            Address::WSH(s) => s,
        }
    }
}

/// NetworkParams holds the encoding parameters for a bitcoin-like network.
/// This is composed of the address version bytes for Legacy PKH and SH
/// addresses, and the bech32 human-readable prefix for witness addresses.
pub trait NetworkParams {
    /// The BECH32 HRP. "bc" for mainnet.
    const HRP: &'static str;
    /// The Legacy PKH base58check version byte. 0x00 for mainnet.
    const PKH_VERSION: u8;
    /// The Legacy SH base58check version byte. 0x05 for mainnet.
    const SH_VERSION: u8;
}

/// The standard encoder for Bitcoin networks. Parameterized by a
/// `NetworkParams` type.
#[derive(Debug, Clone)]
pub struct BitcoinEncoder<P: NetworkParams>(PhantomData<fn(P) -> P>);

impl<P: NetworkParams> BitcoinEncoder<P> {
    /// Encode a script pubkey as an address. Returns `UnknownScriptType` for
    /// scripts that have no address form.
    pub fn encode_address(s: &ScriptPubkey) -> EncodingResult<Address> {
        match s.standard_type() {
            ScriptType::PKH => {
                // s.items contains the op codes. we want only the pkh
                Ok(Address::PKH(encode_base58(
                    P::PKH_VERSION,
                    &s.items()[3..23],
                )))
            }
            ScriptType::SH => {
                // s.items contains the op codes. we want only the sh
                Ok(Address::SH(encode_base58(P::SH_VERSION, &s.items()[2..22])))
            }
            ScriptType::WSH => Ok(Address::WSH(encode_bech32(P::HRP, s.items())?)),
            ScriptType::WPKH => Ok(Address::WPKH(encode_bech32(P::HRP, s.items())?)),
            _ => Err(EncodingError::UnknownScriptType),
        }
    }

    /// Decode an address into the script pubkey it pays.
    pub fn decode_address(addr: &Address) -> EncodingResult<ScriptPubkey> {
        match &addr {
            Address::PKH(s) => {
                let payload = decode_base58(P::PKH_VERSION, s)?;
                if payload.len() != 20 {
                    return Err(EncodingError::UnknownScriptType);
                }
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&payload);
                Ok(ScriptPubkey::p2pkh(&hash))
            }
            Address::SH(s) => {
                let payload = decode_base58(P::SH_VERSION, s)?;
                if payload.len() != 20 {
                    return Err(EncodingError::UnknownScriptType);
                }
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&payload);
                Ok(ScriptPubkey::p2sh(&hash))
            }
            Address::WPKH(s) | Address::WSH(s) => {
                Ok(decode_bech32(P::HRP, s).map(|v| v.into())?)
            }
        }
    }

    /// Attempt to wrap a string as an address of this network, determining
    /// the type from the encoding.
    pub fn string_to_address(string: &str) -> EncodingResult<Address> {
        let s = string.to_owned();
        if s.starts_with(P::HRP) {
            let result = decode_bech32(P::HRP, &s)?;
            match result.len() {
                22 => Ok(Address::WPKH(s)),
                34 => Ok(Address::WSH(s)),
                _ => Err(EncodingError::UnknownScriptType),
            }
        } else if decode_base58(P::PKH_VERSION, &s).is_ok() {
            Ok(Address::PKH(s))
        } else if decode_base58(P::SH_VERSION, &s).is_ok() {
            Ok(Address::SH(s))
        } else {
            Err(EncodingError::UnknownScriptType)
        }
    }
}

/// A param struct for Bitcoin Mainnet
#[derive(Debug, Clone)]
pub struct Main;

impl NetworkParams for Main {
    const HRP: &'static str = "bc";
    const PKH_VERSION: u8 = 0x00;
    const SH_VERSION: u8 = 0x05;
}

/// A param struct for Bitcoin Testnet
#[derive(Debug, Clone)]
pub struct Test;

impl NetworkParams for Test {
    const HRP: &'static str = "tb";
    const PKH_VERSION: u8 = 0x6f;
    const SH_VERSION: u8 = 0xc4;
}

/// An encoder for Bitcoin Mainnet
pub type MainnetEncoder = BitcoinEncoder<Main>;

/// An encoder for Bitcoin Testnet
pub type TestnetEncoder = BitcoinEncoder<Test>;
