//! Sighash computation for legacy and BIP143 (witness) signing.
//!
//! SIGHASH_ALL commits to ALL inputs, and ALL outputs. It indicates that no
//! further modification of the transaction is allowed without invalidating
//! the signature.
//!
//! SIGHASH_ALL + ANYONECANPAY commits to ONE input and ALL outputs. It
//! indicates that anyone may add additional value to the transaction, but
//! that no one may modify the payments made. Any extra value added above the
//! sum of output values will be given to miners as part of the tx fee.
//!
//! SIGHASH_SINGLE commits to ALL inputs, and ONE output. It indicates that
//! anyone may append additional outputs to the transaction to reroute funds
//! from the inputs. Additional inputs cannot be added without invalidating
//! the signature. It is logically difficult to use securely, as it consents
//! to funds being moved, without specifying their destination.
//!
//! SIGHASH_SINGLE commits specifically to the output at the same index as
//! the input being signed. If there is no output at that index (because,
//! e.g. the input vector is longer than the output vector) it behaves
//! insecurely, and we do not implement that protocol bug.
//!
//! SIGHASH_SINGLE + ANYONECANPAY commits to ONE input and ONE output. It
//! indicates that anyone may add additional value to the transaction, and
//! route value to any other location. The signed input and output must be
//! included in the fully-formed transaction at the same index in their
//! respective vectors.
//!
//! For legacy sighash documentation, see here:
//!
//! - <https://en.bitcoin.it/wiki/OP_CHECKSIG#Hashtype_SIGHASH_ALL_.28default.29>
//!
//! For BIP143 sighash documentation, see here:
//!
//! - <https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki>
//!
//! # Note
//!
//! After signing the digest, you MUST append the sighash indicator byte to
//! the resulting signature.

use std::io::Write;

use txforge_core::{
    hashes::{Hash256Digest, Hash256Writer, MarkedDigestWriter},
    ser::ByteFormat,
};

use crate::{
    error::{TransactionError, TxResult},
    transaction::Transaction,
    types::{
        script::{Script, ScriptSig},
        txin::BitcoinTxIn,
        txout::TxOut,
    },
};

/// All possible sighash modes
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sighash {
    /// Sign ALL inputs and ALL outputs
    All = 0x01,
    /// Sign ALL inputs and NO outputs (unsupported)
    None = 0x02,
    /// Sign ALL inputs and ONE output
    Single = 0x03,
    /// Sign ONE input and ALL outputs
    AllACP = 0x81,
    /// Sign ONE input and NO outputs (unsupported)
    NoneACP = 0x82,
    /// Sign ONE input and ONE output
    SingleACP = 0x83,
}

impl Default for Sighash {
    fn default() -> Self {
        Sighash::All
    }
}

impl Sighash {
    /// Covert the flag to its byte representation
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert a u8 into a Sighash flag or an error.
    pub fn from_u8(flag: u8) -> TxResult<Sighash> {
        match flag {
            0x01 => Ok(Sighash::All),
            0x02 => Ok(Sighash::None),
            0x03 => Ok(Sighash::Single),
            0x81 => Ok(Sighash::AllACP),
            0x82 => Ok(Sighash::NoneACP),
            0x83 => Ok(Sighash::SingleACP),
            _ => Err(TransactionError::UnknownSighash(flag)),
        }
    }

    /// True if the ANYONECANPAY bit is set.
    pub fn is_anyone_can_pay(self) -> bool {
        self.to_u8() & 0x80 == 0x80
    }
}

/// Arguments required to serialize the transaction to create the legacy
/// sighash digest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LegacySighashArgs {
    /// The index of the input we'd like to sign
    pub index: usize,
    /// The sighash mode to use.
    pub sighash_flag: Sighash,
    /// The script used in the prevout, which must be signed. In complex
    /// cases involving `OP_CODESEPARATOR` this must be the subset of the
    /// script containing the `OP_CHECKSIG` currently being executed.
    pub prevout_script: Script,
}

/// Arguments required to serialize the transaction to create the BIP143
/// (witness) sighash digest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WitnessSighashArgs {
    /// The index of the input we'd like to sign
    pub index: usize,
    /// The sighash mode to use.
    pub sighash_flag: Sighash,
    /// The script code to commit to, with its length prefix. For P2WPKH
    /// inputs this is the canonical P2PKH script of the pubkey hash; for
    /// P2WSH inputs it is the witness script.
    pub prevout_script: Script,
    /// The value of the prevout.
    pub prevout_value: u64,
}

impl Transaction {
    /// Performs the sighash setup described here:
    /// <https://en.bitcoin.it/wiki/OP_CHECKSIG#How_it_works>
    /// replacing the script sig of the signed input with the prevout script
    /// and blanking all others.
    ///
    /// OP_CODESEPARATOR functionality is NOT provided here.
    fn legacy_sighash_prep(&self, index: usize, prevout_script: &Script) -> Vec<BitcoinTxIn> {
        self.inputs()
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let script_sig = if i == index {
                    ScriptSig::from(prevout_script.items())
                } else {
                    ScriptSig::null()
                };
                BitcoinTxIn::new(input.outpoint(), script_sig, input.sequence())
            })
            .collect()
    }

    /// Modifies the copied vin and vout according to legacy SIGHASH_SINGLE
    /// semantics: commit to the output at the signed index, null all others,
    /// and zero the sequence of every other input.
    fn legacy_sighash_single(vin: &mut [BitcoinTxIn], vout: &mut Vec<TxOut>, index: usize) {
        let mut tx_outs: Vec<TxOut> = (0..index).map(|_| TxOut::null()).collect();
        tx_outs.push(vout[index].clone());
        *vout = tx_outs;

        for (i, txin) in vin.iter_mut().enumerate() {
            if i != index {
                txin.sequence = 0;
            }
        }
    }

    /// Writes the legacy sighash preimage to the provided writer.
    pub fn write_legacy_sighash_preimage<W: Write>(
        &self,
        writer: &mut W,
        args: &LegacySighashArgs,
    ) -> TxResult<()> {
        if args.sighash_flag == Sighash::None || args.sighash_flag == Sighash::NoneACP {
            return Err(TransactionError::NoneUnsupported);
        }

        let mut vin = self.legacy_sighash_prep(args.index, &args.prevout_script);
        let mut vout = self.outputs().to_vec();

        if args.sighash_flag == Sighash::Single || args.sighash_flag == Sighash::SingleACP {
            if args.index >= vout.len() {
                return Err(TransactionError::SighashSingleBug);
            }
            Self::legacy_sighash_single(&mut vin, &mut vout, args.index);
        }

        if args.sighash_flag.is_anyone_can_pay() {
            vin = vec![vin[args.index].clone()];
        }

        Self::write_u32_le(writer, self.version() as u32)?;
        Self::write_prefix_vec(writer, &vin)?;
        Self::write_prefix_vec(writer, &vout)?;
        Self::write_u32_le(writer, self.locktime())?;
        Self::write_u32_le(writer, args.sighash_flag.to_u8() as u32)?;
        Ok(())
    }

    /// Calculates the legacy sighash given the sighash args.
    pub fn legacy_sighash(&self, args: &LegacySighashArgs) -> TxResult<Hash256Digest> {
        let mut w = Hash256Writer::default();
        self.write_legacy_sighash_preimage(&mut w, args)?;
        Ok(w.finish())
    }

    /// Calculates `hash_prevouts` according to BIP143 semantics.
    fn hash_prevouts(&self, sighash_flag: Sighash) -> TxResult<Hash256Digest> {
        if sighash_flag.is_anyone_can_pay() {
            Ok(Hash256Digest::default())
        } else {
            let mut w = Hash256Writer::default();
            for input in self.inputs().iter() {
                input.outpoint().write_to(&mut w)?;
            }
            Ok(w.finish())
        }
    }

    /// Calculates `hash_sequence` according to BIP143 semantics.
    fn hash_sequence(&self, sighash_flag: Sighash) -> TxResult<Hash256Digest> {
        if sighash_flag == Sighash::Single || sighash_flag.is_anyone_can_pay() {
            Ok(Hash256Digest::default())
        } else {
            let mut w = Hash256Writer::default();
            for input in self.inputs().iter() {
                Self::write_u32_le(&mut w, input.sequence())?;
            }
            Ok(w.finish())
        }
    }

    /// Calculates `hash_outputs` according to BIP143 semantics.
    fn hash_outputs(&self, index: usize, sighash_flag: Sighash) -> TxResult<Hash256Digest> {
        match sighash_flag {
            Sighash::All | Sighash::AllACP => {
                let mut w = Hash256Writer::default();
                for output in self.outputs().iter() {
                    output.write_to(&mut w)?;
                }
                Ok(w.finish())
            }
            Sighash::Single | Sighash::SingleACP => {
                let mut w = Hash256Writer::default();
                self.outputs()[index].write_to(&mut w)?;
                Ok(w.finish())
            }
            _ => Ok(Hash256Digest::default()),
        }
    }

    /// Writes the BIP143 sighash preimage to the provided writer.
    pub fn write_witness_sighash_preimage<W: Write>(
        &self,
        writer: &mut W,
        args: &WitnessSighashArgs,
    ) -> TxResult<()> {
        if args.sighash_flag == Sighash::None || args.sighash_flag == Sighash::NoneACP {
            return Err(TransactionError::NoneUnsupported);
        }

        if (args.sighash_flag == Sighash::Single || args.sighash_flag == Sighash::SingleACP)
            && args.index >= self.outputs().len()
        {
            return Err(TransactionError::SighashSingleBug);
        }

        let input = &self.inputs()[args.index];

        Self::write_u32_le(writer, self.version() as u32)?;
        writer.write_all(&self.hash_prevouts(args.sighash_flag)?)?;
        writer.write_all(&self.hash_sequence(args.sighash_flag)?)?;
        input.outpoint().write_to(writer)?;
        args.prevout_script.write_to(writer)?;
        Self::write_u64_le(writer, args.prevout_value)?;
        Self::write_u32_le(writer, input.sequence())?;
        writer.write_all(&self.hash_outputs(args.index, args.sighash_flag)?)?;
        Self::write_u32_le(writer, self.locktime())?;
        Self::write_u32_le(writer, args.sighash_flag.to_u8() as u32)?;
        Ok(())
    }

    /// Calculates the BIP143 sighash given the sighash args.
    pub fn witness_sighash(&self, args: &WitnessSighashArgs) -> TxResult<Hash256Digest> {
        let mut w = Hash256Writer::default();
        self.write_witness_sighash_preimage(&mut w, args)?;
        Ok(w.finish())
    }
}
