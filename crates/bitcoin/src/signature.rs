//! A signature bound to the context that produced it: the public key, the
//! previous-output coordinates, the input index, and the sighash flag.

use k256::ecdsa::Signature;
use serde::{Deserialize, Serialize};
use txforge_core::hashes::MarkedDigest;

use crate::{
    error::{TransactionError, TxResult},
    hashes::TXID,
    keys::Pubkey,
    sighash::Sighash,
    types::txin::BitcoinOutpoint,
};

/// A single signature over a transaction input, with enough context to
/// place it: which key signed, which previous output is being spent, which
/// input slot it authorizes, and under which sighash mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionSignature {
    /// The public key that produced (and can verify) the signature.
    pub public_key: Pubkey,
    /// The txid of the previous output being spent.
    pub prev_txid: TXID,
    /// The index of the previous output within its transaction.
    pub output_index: u32,
    /// The index of the input this signature authorizes.
    pub input_index: usize,
    /// The ECDSA signature, low-S normalized.
    pub signature: Signature,
    /// The sighash mode the signature commits to.
    pub sigtype: Sighash,
}

impl TransactionSignature {
    /// The outpoint of the previous output being spent.
    pub fn outpoint(&self) -> BitcoinOutpoint {
        BitcoinOutpoint::new(self.prev_txid, self.output_index)
    }

    /// The DER encoding of the signature with the sighash byte appended, as
    /// it appears in script sigs and witness stacks.
    pub fn to_der_with_hashtype(&self) -> Vec<u8> {
        let mut out = self.signature.to_der().as_bytes().to_vec();
        out.push(self.sigtype.to_u8());
        out
    }

    /// The object form of the signature, with hex-encoded key and DER
    /// signature.
    pub fn to_object(&self) -> SignatureObject {
        SignatureObject {
            public_key: self.public_key.to_hex(),
            prev_tx_id: self.prev_txid.to_be_hex(),
            output_index: self.output_index,
            input_index: self.input_index,
            signature: hex::encode(self.signature.to_der().as_bytes()),
            sigtype: self.sigtype.to_u8(),
        }
    }

    /// Rebuild a signature from its object form.
    pub fn from_object(obj: &SignatureObject) -> TxResult<Self> {
        let der = hex::decode(&obj.signature)
            .map_err(|e| TransactionError::BadSignature(e.to_string()))?;
        let signature = Signature::from_der(&der)
            .map_err(|e| TransactionError::BadSignature(e.to_string()))?;
        Ok(TransactionSignature {
            public_key: Pubkey::from_hex(&obj.public_key)?,
            prev_txid: TXID::from_be_hex(&obj.prev_tx_id)?,
            output_index: obj.output_index,
            input_index: obj.input_index,
            signature,
            sigtype: Sighash::from_u8(obj.sigtype)?,
        })
    }
}

/// The plain structural form of a `TransactionSignature`, as it appears in
/// the transaction object form.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureObject {
    /// Hex-encoded compressed public key.
    pub public_key: String,
    /// Big-endian (block explorer) hex txid of the previous output.
    pub prev_tx_id: String,
    /// The index of the previous output within its transaction.
    pub output_index: u32,
    /// The index of the input this signature authorizes.
    pub input_index: usize,
    /// Hex-encoded DER signature, without the sighash byte.
    pub signature: String,
    /// The sighash flag byte.
    pub sigtype: u8,
}
