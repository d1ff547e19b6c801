//! Simple types for Bitcoin Script and Witness stack datastructures, each of
//! which is treated as an opaque, wrapped `Vec<u8>` instance.
//!
//! We do not handle assembly, disassembly, or Script execution. Scripts are
//! treated as byte vectors with just enough structure to recognize the
//! standard spendable templates and to build the unlocking forms the signer
//! needs.
//!
//! Scripts can be freely converted between each other using `From` and
//! `Into`. This merely rewraps the underlying `Vec<u8>` in the new type.

use txforge_core::{
    hashes::{Hash160Digest, Hash256Digest},
    impl_script_conversion, wrap_prefixed_byte_vector,
};

/// OP_0 / OP_FALSE
pub const OP_0: u8 = 0x00;
/// OP_RETURN
pub const OP_RETURN: u8 = 0x6a;
/// OP_DUP
pub const OP_DUP: u8 = 0x76;
/// OP_EQUAL
pub const OP_EQUAL: u8 = 0x87;
/// OP_EQUALVERIFY
pub const OP_EQUALVERIFY: u8 = 0x88;
/// OP_HASH160
pub const OP_HASH160: u8 = 0xa9;
/// OP_CHECKSIG
pub const OP_CHECKSIG: u8 = 0xac;
/// OP_CHECKMULTISIG
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// A wrapped script.
pub trait BitcoinScript {}

wrap_prefixed_byte_vector!(
    /// A Script is a marked Vec<u8> for use as an opaque `Script` in
    /// sighash computation (the "script code" or subscript).
    ///
    /// `Script::null()` and `Script::default()` return the empty byte
    /// vector with a 0 prefix, which represents numerical 0, boolean
    /// `false`, or null bytestring.
    Script
);
wrap_prefixed_byte_vector!(
    /// A ScriptSig is a marked Vec<u8> for use in the script_sig.
    ScriptSig
);
wrap_prefixed_byte_vector!(
    /// A WitnessStackItem is a marked `Vec<u8>` intended for use in
    /// witnesses. Each witness is a `Vec<WitnessStackItem>`.
    WitnessStackItem
);
wrap_prefixed_byte_vector!(
    /// A ScriptPubkey is a marked Vec<u8> which locks a TxOut.
    ScriptPubkey
);

impl BitcoinScript for Script {}
impl BitcoinScript for ScriptPubkey {}
impl BitcoinScript for ScriptSig {}
impl BitcoinScript for WitnessStackItem {}

impl_script_conversion!(Script, ScriptPubkey);
impl_script_conversion!(Script, ScriptSig);
impl_script_conversion!(Script, WitnessStackItem);
impl_script_conversion!(ScriptPubkey, ScriptSig);
impl_script_conversion!(ScriptPubkey, WitnessStackItem);
impl_script_conversion!(ScriptSig, WitnessStackItem);

/// A Witness is an ordered stack of `WitnessStackItem`s corresponding to a
/// single input.
///
/// # Note
///
/// The transaction's witness is composed of many of these `Witness`es in an
/// UNPREFIXED vector.
pub type Witness = Vec<WitnessStackItem>;

/// A TxWitness is the UNPREFIXED vector of witnesses
pub type TxWitness = Vec<Witness>;

/// Standard script types, and a non-standard type for all other scripts.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ScriptType {
    /// Pay to Pubkeyhash.
    PKH,
    /// Pay to Scripthash.
    SH,
    /// Pay to Witness Pubkeyhash.
    WPKH,
    /// Pay to Witness Scripthash.
    WSH,
    /// Bare Pay to Pubkey.
    PK,
    /// OP_RETURN
    #[allow(non_camel_case_types)]
    OP_RETURN,
    /// Nonstandard or unknown `Script` type. May be a newer witness version.
    NonStandard,
}

/// Append a minimally-encoded data push to a script byte vector.
pub fn push_data(buf: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0..=0x4b => buf.push(data.len() as u8),
        0x4c..=0xff => {
            buf.push(0x4c);
            buf.push(data.len() as u8);
        }
        0x100..=0xffff => {
            buf.push(0x4d);
            buf.extend((data.len() as u16).to_le_bytes());
        }
        _ => {
            buf.push(0x4e);
            buf.extend((data.len() as u32).to_le_bytes());
        }
    }
    buf.extend(data);
}

impl Script {
    /// Build a bare multisig redeem script: `OP_m <keys> OP_n
    /// OP_CHECKMULTISIG`. Caller is responsible for key ordering; see
    /// `TxnInput::resolve` for the BIP67-style sorted construction.
    ///
    /// Both `threshold` and the key count must be in `1..=16` to be
    /// encodable as small-int opcodes.
    pub fn multisig(threshold: usize, keys: &[[u8; 33]]) -> Self {
        let mut buf = vec![0x50 + threshold as u8];
        for key in keys.iter() {
            push_data(&mut buf, key);
        }
        buf.push(0x50 + keys.len() as u8);
        buf.push(OP_CHECKMULTISIG);
        Script::new(buf)
    }
}

impl ScriptPubkey {
    /// Build a pay-to-pubkey-hash script from a pubkey hash.
    pub fn p2pkh(hash: &Hash160Digest) -> Self {
        let mut buf = vec![OP_DUP, OP_HASH160, 0x14];
        buf.extend(hash);
        buf.extend([OP_EQUALVERIFY, OP_CHECKSIG]);
        ScriptPubkey::new(buf)
    }

    /// Build a pay-to-script-hash script from a script hash.
    pub fn p2sh(hash: &Hash160Digest) -> Self {
        let mut buf = vec![OP_HASH160, 0x14];
        buf.extend(hash);
        buf.push(OP_EQUAL);
        ScriptPubkey::new(buf)
    }

    /// Build a v0 pay-to-witness-pubkey-hash script from a pubkey hash.
    pub fn p2wpkh(hash: &Hash160Digest) -> Self {
        let mut buf = vec![OP_0, 0x14];
        buf.extend(hash);
        ScriptPubkey::new(buf)
    }

    /// Build a v0 pay-to-witness-script-hash script from a sha256 script
    /// digest.
    pub fn p2wsh(hash: &Hash256Digest) -> Self {
        let mut buf = vec![OP_0, 0x20];
        buf.extend(hash);
        ScriptPubkey::new(buf)
    }

    /// Build a bare pay-to-pubkey script from a compressed public key.
    pub fn p2pk(pubkey: &[u8; 33]) -> Self {
        let mut buf = vec![];
        push_data(&mut buf, pubkey);
        buf.push(OP_CHECKSIG);
        ScriptPubkey::new(buf)
    }

    /// Extract the op return payload. None if not an op return. Does not
    /// extract OP_RETURN blobs larger than 75 bytes.
    pub fn extract_op_return_data(&self) -> Option<Vec<u8>> {
        // check before indexing to avoid potential panic on malformed input
        if self.len() < 2 {
            return None;
        }

        if self[0] == OP_RETURN && self[1] <= 75 && self[1] as usize == (self.len() - 2) {
            return Some(self.0[2..].to_vec());
        }
        None
    }

    /// True if the script is a null-data (OP_RETURN) script. Such outputs
    /// are provably unspendable and exempt from the dust check.
    pub fn is_data_out(&self) -> bool {
        !self.is_empty() && self[0] == OP_RETURN
    }

    /// Inspect the `Script` to determine its type.
    pub fn standard_type(&self) -> ScriptType {
        if self.extract_op_return_data().is_some() {
            return ScriptType::OP_RETURN;
        }

        let items = &self.0;
        match self.0.len() {
            0x19 => {
                // PKH
                if items[0..3] == [OP_DUP, OP_HASH160, 0x14]
                    && items[0x17..] == [OP_EQUALVERIFY, OP_CHECKSIG]
                {
                    ScriptType::PKH
                } else {
                    ScriptType::NonStandard
                }
            }
            0x17 => {
                // SH
                if items[0..2] == [OP_HASH160, 0x14] && items[0x16..] == [OP_EQUAL] {
                    ScriptType::SH
                } else {
                    ScriptType::NonStandard
                }
            }
            0x16 => {
                // WPKH
                if items[0..2] == [OP_0, 0x14] {
                    ScriptType::WPKH
                } else {
                    ScriptType::NonStandard
                }
            }
            0x22 => {
                if items[0..2] == [OP_0, 0x20] {
                    ScriptType::WSH
                } else {
                    ScriptType::NonStandard
                }
            }
            0x23 => {
                // compressed-key PK
                if items[0] == 0x21 && items[0x22] == OP_CHECKSIG {
                    ScriptType::PK
                } else {
                    ScriptType::NonStandard
                }
            }
            0x43 => {
                // uncompressed-key PK
                if items[0] == 0x41 && items[0x42] == OP_CHECKSIG {
                    ScriptType::PK
                } else {
                    ScriptType::NonStandard
                }
            }
            _ => ScriptType::NonStandard,
        }
    }

    /// Extract the hash payload committed to by a standard script: the
    /// pubkey hash for PKH/WPKH, the script hash for SH, the sha256 script
    /// digest for WSH. None for other types.
    pub fn extract_hash_payload(&self) -> Option<&[u8]> {
        match self.standard_type() {
            ScriptType::PKH => Some(&self.0[3..23]),
            ScriptType::SH | ScriptType::WPKH => Some(&self.0[2..22]),
            ScriptType::WSH => Some(&self.0[2..34]),
            _ => None,
        }
    }

    /// Extract the public key from a bare pay-to-pubkey script. None for
    /// other types.
    pub fn extract_pubkey(&self) -> Option<&[u8]> {
        match self.standard_type() {
            ScriptType::PK => Some(&self.0[1..self.0.len() - 1]),
            _ => None,
        }
    }
}

impl ScriptSig {
    /// Build the unlocking script for a P2PKH input: `<sig+hashtype>
    /// <pubkey>`.
    pub fn p2pkh(sig_with_hashtype: &[u8], pubkey: &[u8; 33]) -> Self {
        let mut buf = vec![];
        push_data(&mut buf, sig_with_hashtype);
        push_data(&mut buf, pubkey);
        ScriptSig::new(buf)
    }

    /// Build the unlocking script for a bare P2PK input: `<sig+hashtype>`.
    pub fn p2pk(sig_with_hashtype: &[u8]) -> Self {
        let mut buf = vec![];
        push_data(&mut buf, sig_with_hashtype);
        ScriptSig::new(buf)
    }

    /// Build the unlocking script for a P2SH multisig input:
    /// `OP_0 <sigs...> <redeem script>`.
    pub fn p2sh_multisig(sigs_with_hashtype: &[Vec<u8>], redeem: &Script) -> Self {
        let mut buf = vec![OP_0];
        for sig in sigs_with_hashtype.iter() {
            push_data(&mut buf, sig);
        }
        push_data(&mut buf, redeem.items());
        ScriptSig::new(buf)
    }

    /// Build the unlocking script carrying a nested witness program: a
    /// single push of the program bytes.
    pub fn nested_witness_program(program: &ScriptPubkey) -> Self {
        let mut buf = vec![];
        push_data(&mut buf, program.items());
        ScriptSig::new(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use txforge_core::{
        hashes::{hash160, sha256},
        ser::ByteFormat,
    };

    #[test]
    fn it_serializes_and_derializes_scripts() {
        let cases = [
            (
                Script::new(hex::decode("0014758ce550380d964051086798d6546bebdca27a73").unwrap()),
                "160014758ce550380d964051086798d6546bebdca27a73",
                22,
            ),
            (Script::new(vec![]), "00", 0),
            (Script::null(), "00", 0),
        ];
        for case in cases.iter() {
            let prevout_script = Script::deserialize_hex(case.1).unwrap();
            assert_eq!(case.0.serialize_hex(), case.1);
            assert_eq!(case.0.len(), case.2);
            assert_eq!(case.0.is_empty(), case.2 == 0);

            assert_eq!(prevout_script, case.0);
            assert_eq!(prevout_script.serialize_hex(), case.1);
            assert_eq!(prevout_script.len(), case.2);
            assert_eq!(prevout_script.is_empty(), case.2 == 0);
        }
    }

    #[test]
    fn it_determines_script_pubkey_types_accurately() {
        let cases = [
            (ScriptPubkey::new(hex::decode("a914e88869b88866281ab166541ad8aafba8f8aba47a87").unwrap()), ScriptType::SH),
            (ScriptPubkey::new(hex::decode("a914e88869b88866281ab166541ad8aafba8f8aba47a89").unwrap()), ScriptType::NonStandard), // wrong last byte
            (ScriptPubkey::new(hex::decode("aa14e88869b88866281ab166541ad8aafba8f8aba47a87").unwrap()), ScriptType::NonStandard), // wrong first byte
            (ScriptPubkey::new(hex::decode("76a9140e5c3c8d420c7f11e88d76f7b860d471e6517a4488ac").unwrap()), ScriptType::PKH),
            (ScriptPubkey::new(hex::decode("76a9140e5c3c8d420c7f11e88d76f7b860d471e6517a4488ad").unwrap()), ScriptType::NonStandard), // wrong last byte
            (ScriptPubkey::new(hex::decode("77a9140e5c3c8d420c7f11e88d76f7b860d471e6517a4488ac").unwrap()), ScriptType::NonStandard), // wrong first byte
            (ScriptPubkey::new(hex::decode("00201bf8a1831db5443b42a44f30a121d1b616d011ab15df62b588722a845864cc99").unwrap()), ScriptType::WSH),
            (ScriptPubkey::new(hex::decode("01201bf8a1831db5443b42a44f30a121d1b616d011ab15df62b588722a845864cc99").unwrap()), ScriptType::NonStandard), // wrong witness program version
            (ScriptPubkey::new(hex::decode("00141bf8a1831db5443b42a44f30a121d1b616d011ab").unwrap()), ScriptType::WPKH),
            (ScriptPubkey::new(hex::decode("01141bf8a1831db5443b42a44f30a121d1b616d011ab").unwrap()), ScriptType::NonStandard), // wrong witness program version
            (ScriptPubkey::new(hex::decode("210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ac").unwrap()), ScriptType::PK),
            (ScriptPubkey::new(hex::decode("210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ad").unwrap()), ScriptType::NonStandard), // wrong last byte
            (ScriptPubkey::new(hex::decode("0011223344").unwrap()), ScriptType::NonStandard), // junk
            (ScriptPubkey::new(hex::decode("deadbeefdeadbeefdeadbeefdeadbeef").unwrap()), ScriptType::NonStandard), // junk
        ];

        for case in cases.iter() {
            let (script, t) = case;
            assert_eq!(script.standard_type(), *t);
        }
    }

    #[test]
    fn it_builds_standard_templates() {
        let pubkey: [u8; 33] =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap()
                .try_into()
                .unwrap();
        let pkh = hash160(&pubkey);

        let p2pkh = ScriptPubkey::p2pkh(&pkh);
        assert_eq!(p2pkh.standard_type(), ScriptType::PKH);
        assert_eq!(p2pkh.extract_hash_payload().unwrap(), &pkh[..]);

        let p2wpkh = ScriptPubkey::p2wpkh(&pkh);
        assert_eq!(p2wpkh.standard_type(), ScriptType::WPKH);
        assert_eq!(p2wpkh.extract_hash_payload().unwrap(), &pkh[..]);

        let p2pk = ScriptPubkey::p2pk(&pubkey);
        assert_eq!(p2pk.standard_type(), ScriptType::PK);
        assert_eq!(p2pk.extract_pubkey().unwrap(), &pubkey[..]);

        let redeem = Script::multisig(1, &[pubkey]);
        let sh = hash160(redeem.items());
        let p2sh = ScriptPubkey::p2sh(&sh);
        assert_eq!(p2sh.standard_type(), ScriptType::SH);
        assert_eq!(p2sh.extract_hash_payload().unwrap(), &sh[..]);

        let wsh = sha256(redeem.items());
        let p2wsh = ScriptPubkey::p2wsh(&wsh);
        assert_eq!(p2wsh.standard_type(), ScriptType::WSH);
        assert_eq!(p2wsh.extract_hash_payload().unwrap(), &wsh[..]);
    }

    #[test]
    fn it_encodes_data_pushes_minimally() {
        let cases: [(usize, Vec<u8>); 3] = [
            (10, vec![10]),
            (80, vec![0x4c, 80]),
            (300, vec![0x4d, 0x2c, 0x01]),
        ];
        for (len, prefix) in cases.iter() {
            let mut buf = vec![];
            push_data(&mut buf, &vec![0xaa; *len]);
            assert_eq!(&buf[..prefix.len()], &prefix[..]);
            assert_eq!(buf.len(), prefix.len() + len);
        }
    }

    #[test]
    fn it_recognizes_data_outputs() {
        let mut buf = vec![OP_RETURN];
        push_data(&mut buf, b"hello world");
        let script = ScriptPubkey::new(buf);
        assert!(script.is_data_out());
        assert_eq!(script.standard_type(), ScriptType::OP_RETURN);
        assert_eq!(script.extract_op_return_data().unwrap(), b"hello world");
        assert!(!ScriptPubkey::null().is_data_out());
    }
}
