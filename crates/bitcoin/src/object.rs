//! The plain structural ("object") form of a transaction, and its JSON
//! round-trip.
//!
//! The object form preserves hex-encoded ids and scripts, numeric amounts,
//! per-input signature arrays, and the change/fee bookkeeping. Rebuilding a
//! transaction from object form re-runs input variant resolution against the
//! embedded previous-output scripts, and checks any embedded `hash` against
//! the reconstructed transaction id.

use serde::{Deserialize, Serialize};
use txforge_core::ser::SerError;

use crate::{
    error::{TransactionError, TxResult},
    hashes::TXID,
    input::Input,
    keys::Pubkey,
    signature::{SignatureObject, TransactionSignature},
    transaction::Transaction,
    types::{
        script::{ScriptPubkey, ScriptSig, ScriptType},
        txin::{BitcoinOutpoint, BitcoinTxIn},
        txout::TxOut,
        utxo::Utxo,
    },
};

/// The object form of a transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct OutputObject {
    /// The output amount.
    pub satoshis: u64,
    /// The locking script, as unprefixed hex.
    pub script: String,
}

/// The object form of a transaction input.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputObject {
    /// Big-endian (block explorer) hex txid of the previous output.
    pub prev_tx_id: String,
    /// The index of the previous output within its transaction.
    pub output_index: u32,
    /// The nSequence field.
    pub sequence_number: u32,
    /// The unlocking script, as unprefixed hex.
    pub script: String,
    /// The previous output, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputObject>,
    /// The ordered public key set, for multisig inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<String>>,
    /// The signature threshold, for multisig inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<usize>,
    /// Slot-aligned signatures, for multisig inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Option<SignatureObject>>>,
}

/// The object form of a transaction.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TxObject {
    /// The big-endian transaction id of the serialized form. Checked on
    /// reconstruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// The transaction version.
    pub version: i32,
    /// The ordered inputs.
    pub inputs: Vec<InputObject>,
    /// The ordered outputs, including any materialized change output.
    pub outputs: Vec<OutputObject>,
    /// The raw nLockTime field.
    #[serde(rename = "nLockTime")]
    pub n_lock_time: u32,
    /// The recorded change script, as unprefixed hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_script: Option<String>,
    /// The current position of the change output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_index: Option<usize>,
    /// The explicitly declared fee, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
}

fn decode_hex(s: &str) -> TxResult<Vec<u8>> {
    Ok(hex::decode(s).map_err(SerError::from)?)
}

impl TxOut {
    fn to_object(&self) -> OutputObject {
        OutputObject {
            satoshis: self.value,
            script: hex::encode(self.script_pubkey.items()),
        }
    }
}

impl Transaction {
    /// Produce the plain structural form of the transaction.
    pub fn to_object(&self) -> TxObject {
        let inputs = self
            .inputs()
            .iter()
            .map(|input| {
                let outpoint = input.outpoint();
                let mut obj = InputObject {
                    prev_tx_id: outpoint.txid_be_hex(),
                    output_index: outpoint.idx,
                    sequence_number: input.sequence(),
                    script: hex::encode(input.script_sig().items()),
                    output: input.utxo().map(|utxo| OutputObject {
                        satoshis: utxo.value,
                        script: hex::encode(utxo.script_pubkey.items()),
                    }),
                    public_keys: None,
                    threshold: None,
                    signatures: None,
                };
                if let Some(multisig) = input.as_multisig() {
                    obj.public_keys = Some(
                        multisig.public_keys().iter().map(|k| k.to_hex()).collect(),
                    );
                    obj.threshold = Some(multisig.threshold());
                    obj.signatures = Some(
                        multisig
                            .signature_slots()
                            .iter()
                            .map(|slot| slot.as_ref().map(|sig| sig.to_object()))
                            .collect(),
                    );
                }
                obj
            })
            .collect();

        TxObject {
            hash: Some(self.txid().to_be_hex()),
            version: self.version(),
            inputs,
            outputs: self.outputs().iter().map(|o| o.to_object()).collect(),
            n_lock_time: self.locktime(),
            change_script: self
                .change_script()
                .map(|script| hex::encode(script.items())),
            change_index: self.change_index(),
            fee: self.fee,
        }
    }

    /// Rebuild a transaction from its object form. Input variants are
    /// re-resolved from the embedded previous-output scripts; an embedded
    /// `hash` must match the reconstructed transaction id.
    pub fn from_object(obj: &TxObject) -> TxResult<Self> {
        let mut tx = Transaction::new();

        for iobj in obj.inputs.iter() {
            let outpoint =
                BitcoinOutpoint::new(TXID::from_be_hex(&iobj.prev_tx_id)?, iobj.output_index);
            let script_sig = ScriptSig::new(decode_hex(&iobj.script)?);

            let oobj = match &iobj.output {
                None => {
                    tx.unchecked_add_input(Input::from_wire(BitcoinTxIn::new(
                        outpoint,
                        script_sig,
                        iobj.sequence_number,
                    )));
                    continue;
                }
                Some(oobj) => oobj,
            };

            let script_pubkey = ScriptPubkey::new(decode_hex(&oobj.script)?);
            let script_type = script_pubkey.standard_type();
            let utxo = Utxo::new(outpoint, oobj.satoshis, script_pubkey);

            let is_scripthash =
                script_type == ScriptType::SH || script_type == ScriptType::WSH;
            let mut input = match (&iobj.public_keys, iobj.threshold) {
                (Some(keys_hex), Some(threshold)) if is_scripthash => {
                    let public_keys = keys_hex
                        .iter()
                        .map(|hex_key| Pubkey::from_hex(hex_key))
                        .collect::<TxResult<Vec<_>>>()?;
                    // keys were stored in final order; don't re-sort
                    let mut input =
                        Input::resolve_multisig(utxo, public_keys, threshold, false)?;
                    if let Some(slots) = &iobj.signatures {
                        for sobj in slots.iter().flatten() {
                            input.accept_signature(TransactionSignature::from_object(sobj)?)?;
                        }
                    }
                    input
                }
                _ => match script_type {
                    ScriptType::PKH
                    | ScriptType::WPKH
                    | ScriptType::SH
                    | ScriptType::PK => {
                        let mut input = Input::resolve(utxo)?;
                        input.set_script_sig(script_sig);
                        input
                    }
                    _ => {
                        return Err(TransactionError::UnsupportedScriptType(
                            oobj.script.clone(),
                        ))
                    }
                },
            };
            input.set_sequence(iobj.sequence_number);
            tx.add_input(input)?;
        }

        for oobj in obj.outputs.iter() {
            tx.add_output(TxOut::new(oobj.satoshis, ScriptPubkey::new(decode_hex(&oobj.script)?)));
        }

        tx.nlocktime = obj.n_lock_time;
        tx.version = obj.version;
        tx.change_index = obj.change_index;
        tx.change_script = match &obj.change_script {
            Some(hex_script) => Some(ScriptPubkey::new(decode_hex(hex_script)?)),
            None => None,
        };
        tx.fee = obj.fee;
        tx.change_stale = false;

        tx.check_consistency()?;
        if let Some(hash) = &obj.hash {
            if tx.txid().to_be_hex() != *hash {
                return Err(TransactionError::HashMismatch);
            }
        }
        Ok(tx)
    }

    fn check_consistency(&self) -> TxResult<()> {
        if let Some(ci) = self.change_index {
            let change_script = self.change_script.as_ref().ok_or_else(|| {
                TransactionError::InvalidArgument("change script is expected".to_owned())
            })?;
            let output = self.outputs.get(ci).ok_or_else(|| {
                TransactionError::InvalidArgument(
                    "change index points to undefined output".to_owned(),
                )
            })?;
            if &output.script_pubkey != change_script {
                return Err(TransactionError::InvalidArgument(
                    "change output has an unexpected script".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Serialize the object form as JSON.
    pub fn to_json(&self) -> TxResult<String> {
        Ok(serde_json::to_string(&self.to_object())?)
    }

    /// Rebuild a transaction from its JSON object form.
    pub fn from_json(json: &str) -> TxResult<Self> {
        let obj: TxObject = serde_json::from_str(json)?;
        Self::from_object(&obj)
    }
}
