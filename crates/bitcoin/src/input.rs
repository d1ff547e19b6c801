//! Polymorphic transaction inputs.
//!
//! The spendable script shapes map to four variants: `PublicKeyHash` (P2PKH,
//! P2WPKH, and P2WPKH nested in P2SH), `PublicKey` (bare P2PK),
//! `MultiSigScriptHash` (P2SH, P2WSH, and nested multisig), and `Unknown`
//! for inputs whose previous output is not available or not recognized.
//!
//! `Unknown` is a first-class variant, not an error case. It appears when a
//! transaction is parsed from raw bytes, carries only raw unlocking data,
//! and fails any signing or verification query with
//! `UnableToVerifySignature`.

use txforge_core::{
    hashes::{hash160, sha256, Hash256Digest},
    ser::ByteFormat,
};

use crate::{
    error::{TransactionError, TxResult},
    keys::{Privkey, Pubkey},
    policy::{
        DEFAULT_SEQUENCE, SEQUENCE_LOCKTIME_DISABLE_FLAG, SEQUENCE_LOCKTIME_GRANULARITY,
        SEQUENCE_LOCKTIME_MASK, SEQUENCE_LOCKTIME_TYPE_FLAG,
    },
    sighash::{LegacySighashArgs, Sighash, WitnessSighashArgs},
    signature::TransactionSignature,
    transaction::Transaction,
    types::{
        script::{Script, ScriptPubkey, ScriptSig, ScriptType, Witness, WitnessStackItem},
        txin::{BitcoinOutpoint, BitcoinTxIn},
        utxo::Utxo,
    },
};

/// Maximum size of a signature push: push byte + DER (<=72) + sighash byte.
const MAX_SIGNATURE_SIZE: usize = 74;
/// Maximum size of a pubkey push: push byte + compressed key.
const MAX_PUBKEY_SIZE: usize = 34;
/// Multisig script overhead: OP_0 + OP_m + OP_n + OP_CHECKMULTISIG + pushes.
const MULTISIG_OPCODES_SIZE: usize = 8;
/// ScriptSig size of a nested witness program push.
const NESTED_PROGRAM_SIZE: usize = 35;
/// Outpoint + sequence, without any script bytes.
const INPUT_BASE_SIZE: usize = 36 + 4;
/// Witness bytes are discounted by this factor in virtual size.
const WITNESS_DISCOUNT: usize = 4;

/// State common to every input variant: the outpoint being spent, the
/// unlocking data accumulated so far, and the previous output information
/// when it is known.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputBase {
    /// The outpoint of the UTXO being spent.
    pub outpoint: BitcoinOutpoint,
    /// The unlocking script.
    pub script_sig: ScriptSig,
    /// The nSequence field.
    pub sequence: u32,
    /// The witness stack for this input. Empty for legacy spends.
    pub witness: Witness,
    /// The previous output, when known. Inputs parsed from raw bytes have
    /// no previous output information.
    pub utxo: Option<Utxo>,
}

impl InputBase {
    fn from_utxo(utxo: Utxo, sequence: u32) -> Self {
        InputBase {
            outpoint: utxo.outpoint,
            script_sig: ScriptSig::null(),
            sequence,
            witness: vec![],
            utxo: Some(utxo),
        }
    }

    /// View the input as its wire form.
    pub fn as_wire(&self) -> BitcoinTxIn {
        BitcoinTxIn::new(self.outpoint, self.script_sig.clone(), self.sequence)
    }

    fn require_utxo(&self) -> TxResult<&Utxo> {
        self.utxo
            .as_ref()
            .ok_or(TransactionError::MissingPreviousOutputInfo)
    }
}

/// The semantic reading of an input's BIP68 relative lock.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelativeLockTime {
    /// The input is locked for this many blocks after its prevout confirms.
    Blocks(u32),
    /// The input is locked for this many seconds after its prevout
    /// confirms, in 512-second granularity.
    Seconds(u32),
}

/// The spend path of a pubkey-hash input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PkhSpendPath {
    /// Plain P2PKH, legacy sighash, unlocking data in the script sig.
    Legacy,
    /// Native P2WPKH, BIP143 sighash, unlocking data in the witness.
    Witness,
    /// P2WPKH nested in P2SH. BIP143 sighash, witness unlocking data, and a
    /// script sig carrying the witness program.
    NestedWitness,
}

/// A pay-to-pubkey-hash input (including the witness and nested-witness
/// forms). Holds at most one signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PkhInput {
    base: InputBase,
    path: PkhSpendPath,
    signature: Option<TransactionSignature>,
}

impl PkhInput {
    fn new(utxo: Utxo, sequence: u32) -> Self {
        let path = match utxo.script_pubkey.standard_type() {
            ScriptType::WPKH => PkhSpendPath::Witness,
            ScriptType::SH => PkhSpendPath::NestedWitness,
            _ => PkhSpendPath::Legacy,
        };
        PkhInput {
            base: InputBase::from_utxo(utxo, sequence),
            path,
            signature: None,
        }
    }

    /// True if the given key can satisfy this input's locking script.
    fn can_sign(&self, pubkey: &Pubkey) -> bool {
        let script = match self.base.utxo.as_ref() {
            Some(utxo) => &utxo.script_pubkey,
            None => return false,
        };
        let payload = match script.extract_hash_payload() {
            Some(p) => p,
            None => return false,
        };
        match self.path {
            PkhSpendPath::Legacy | PkhSpendPath::Witness => {
                payload == &pubkey.hash160()[..]
            }
            PkhSpendPath::NestedWitness => {
                let program = ScriptPubkey::p2wpkh(&pubkey.hash160());
                payload == &hash160(program.items())[..]
            }
        }
    }

    fn sighash(
        &self,
        tx: &Transaction,
        index: usize,
        pubkey: &Pubkey,
        sigtype: Sighash,
    ) -> TxResult<Hash256Digest> {
        let utxo = self.base.require_utxo()?;
        match self.path {
            PkhSpendPath::Legacy => tx.legacy_sighash(&LegacySighashArgs {
                index,
                sighash_flag: sigtype,
                prevout_script: Script::from(utxo.script_pubkey.items()),
            }),
            PkhSpendPath::Witness | PkhSpendPath::NestedWitness => {
                let script_code = ScriptPubkey::p2pkh(&pubkey.hash160());
                tx.witness_sighash(&WitnessSighashArgs {
                    index,
                    sighash_flag: sigtype,
                    prevout_script: Script::from(script_code.items()),
                    prevout_value: utxo.value,
                })
            }
        }
    }

    fn update_script(&mut self) {
        match (&self.signature, self.path) {
            (None, _) => {
                self.base.script_sig = ScriptSig::null();
                self.base.witness = vec![];
            }
            (Some(sig), PkhSpendPath::Legacy) => {
                self.base.script_sig =
                    ScriptSig::p2pkh(&sig.to_der_with_hashtype(), &sig.public_key.to_array());
                self.base.witness = vec![];
            }
            (Some(sig), path) => {
                self.base.witness = vec![
                    WitnessStackItem::new(sig.to_der_with_hashtype()),
                    WitnessStackItem::new(sig.public_key.to_array().to_vec()),
                ];
                self.base.script_sig = if path == PkhSpendPath::NestedWitness {
                    let program = ScriptPubkey::p2wpkh(&sig.public_key.hash160());
                    ScriptSig::nested_witness_program(&program)
                } else {
                    ScriptSig::null()
                };
            }
        }
    }

    fn estimated_size(&self) -> usize {
        let script_max = MAX_SIGNATURE_SIZE + MAX_PUBKEY_SIZE;
        match self.path {
            PkhSpendPath::Legacy => INPUT_BASE_SIZE + 1 + script_max,
            PkhSpendPath::Witness => {
                INPUT_BASE_SIZE + 1 + div_ceil(script_max, WITNESS_DISCOUNT)
            }
            PkhSpendPath::NestedWitness => {
                INPUT_BASE_SIZE + 1 + 23 + div_ceil(script_max, WITNESS_DISCOUNT)
            }
        }
    }
}

/// A bare pay-to-pubkey input. Holds at most one signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PkInput {
    base: InputBase,
    signature: Option<TransactionSignature>,
}

impl PkInput {
    fn new(utxo: Utxo, sequence: u32) -> Self {
        PkInput {
            base: InputBase::from_utxo(utxo, sequence),
            signature: None,
        }
    }

    fn can_sign(&self, pubkey: &Pubkey) -> bool {
        self.base
            .utxo
            .as_ref()
            .and_then(|utxo| utxo.script_pubkey.extract_pubkey())
            .map(|embedded| embedded == &pubkey.to_array()[..])
            .unwrap_or(false)
    }

    fn sighash(&self, tx: &Transaction, index: usize, sigtype: Sighash) -> TxResult<Hash256Digest> {
        let utxo = self.base.require_utxo()?;
        tx.legacy_sighash(&LegacySighashArgs {
            index,
            sighash_flag: sigtype,
            prevout_script: Script::from(utxo.script_pubkey.items()),
        })
    }

    fn update_script(&mut self) {
        self.base.script_sig = match &self.signature {
            Some(sig) => ScriptSig::p2pk(&sig.to_der_with_hashtype()),
            None => ScriptSig::null(),
        };
    }

    fn estimated_size(&self) -> usize {
        INPUT_BASE_SIZE + 1 + MAX_SIGNATURE_SIZE
    }
}

/// The spend path of a script-hash multisig input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MultisigSpendPath {
    /// Plain P2SH, legacy sighash.
    Legacy,
    /// Native P2WSH, BIP143 sighash.
    Witness,
    /// P2WSH nested in P2SH.
    NestedWitness,
}

/// A script-hash multisig input (P2SH, P2WSH, or nested). Holds the ordered
/// public key set, the signature threshold, and one signature slot per key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultisigInput {
    base: InputBase,
    public_keys: Vec<Pubkey>,
    threshold: usize,
    signatures: Vec<Option<TransactionSignature>>,
    redeem_script: Script,
    path: MultisigSpendPath,
}

impl MultisigInput {
    fn new(
        utxo: Utxo,
        mut public_keys: Vec<Pubkey>,
        threshold: usize,
        sort_keys: bool,
        sequence: u32,
    ) -> TxResult<Self> {
        if threshold > public_keys.len() || threshold == 0 {
            return Err(TransactionError::InvalidThreshold {
                threshold,
                keys: public_keys.len(),
            });
        }
        if public_keys.len() > 16 {
            return Err(TransactionError::InvalidArgument(
                "multisig supports at most 16 public keys".to_owned(),
            ));
        }

        if sort_keys {
            public_keys.sort_by_key(|k| k.to_array());
        }
        let key_arrays: Vec<[u8; 33]> = public_keys.iter().map(|k| k.to_array()).collect();
        let redeem_script = Script::multisig(threshold, &key_arrays);

        let wsh_program = ScriptPubkey::p2wsh(&sha256(redeem_script.items()));
        let path = if wsh_program == utxo.script_pubkey {
            MultisigSpendPath::Witness
        } else if ScriptPubkey::p2sh(&hash160(wsh_program.items())) == utxo.script_pubkey {
            MultisigSpendPath::NestedWitness
        } else if ScriptPubkey::p2sh(&hash160(redeem_script.items())) == utxo.script_pubkey {
            MultisigSpendPath::Legacy
        } else {
            return Err(TransactionError::InvalidArgument(
                "provided public keys don't hash to the provided output".to_owned(),
            ));
        };

        let slots = public_keys.len();
        let mut input = MultisigInput {
            base: InputBase::from_utxo(utxo, sequence),
            public_keys,
            threshold,
            signatures: vec![None; slots],
            redeem_script,
            path,
        };
        input.update_script();
        Ok(input)
    }

    /// The ordered public key set.
    pub fn public_keys(&self) -> &[Pubkey] {
        &self.public_keys
    }

    /// The signature threshold `m`.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// The redeem (or witness) script the keys hash into.
    pub fn redeem_script(&self) -> &Script {
        &self.redeem_script
    }

    /// The number of signatures collected so far.
    pub fn count_signatures(&self) -> usize {
        self.signatures.iter().flatten().count()
    }

    /// The number of signatures still required.
    pub fn count_missing_signatures(&self) -> usize {
        self.threshold - self.count_signatures()
    }

    /// The signature slots, one per public key, in key order.
    pub fn signature_slots(&self) -> &[Option<TransactionSignature>] {
        &self.signatures
    }

    /// The public keys that have not yet provided a signature.
    pub fn pubkeys_without_signature(&self) -> Vec<&Pubkey> {
        self.public_keys
            .iter()
            .zip(self.signatures.iter())
            .filter(|(_, sig)| sig.is_none())
            .map(|(key, _)| key)
            .collect()
    }

    fn is_witness(&self) -> bool {
        self.path != MultisigSpendPath::Legacy
    }

    fn sighash(&self, tx: &Transaction, index: usize, sigtype: Sighash) -> TxResult<Hash256Digest> {
        let utxo = self.base.require_utxo()?;
        if self.is_witness() {
            tx.witness_sighash(&WitnessSighashArgs {
                index,
                sighash_flag: sigtype,
                prevout_script: self.redeem_script.clone(),
                prevout_value: utxo.value,
            })
        } else {
            tx.legacy_sighash(&LegacySighashArgs {
                index,
                sighash_flag: sigtype,
                prevout_script: self.redeem_script.clone(),
            })
        }
    }

    fn update_script(&mut self) {
        let sigs: Vec<Vec<u8>> = self
            .signatures
            .iter()
            .flatten()
            .map(|sig| sig.to_der_with_hashtype())
            .collect();

        if self.is_witness() {
            // The initial empty item absorbs the extra element
            // OP_CHECKMULTISIG pops.
            let mut stack = vec![WitnessStackItem::null()];
            stack.extend(sigs.iter().map(|s| WitnessStackItem::new(s.clone())));
            stack.push(WitnessStackItem::new(self.redeem_script.items().to_vec()));
            self.base.witness = stack;
            self.base.script_sig = if self.path == MultisigSpendPath::NestedWitness {
                let program = ScriptPubkey::p2wsh(&sha256(self.redeem_script.items()));
                ScriptSig::nested_witness_program(&program)
            } else {
                ScriptSig::null()
            };
        } else {
            self.base.script_sig = ScriptSig::p2sh_multisig(&sigs, &self.redeem_script);
            self.base.witness = vec![];
        }
    }

    fn accept(&mut self, sig: TransactionSignature) -> TxResult<()> {
        if self.count_signatures() == self.threshold {
            return Err(TransactionError::InvalidArgument(
                "all needed signatures have already been added".to_owned(),
            ));
        }
        let slot = self
            .public_keys
            .iter()
            .position(|key| key == &sig.public_key)
            .ok_or_else(|| {
                TransactionError::InvalidArgument(
                    "signature has no matching public key".to_owned(),
                )
            })?;
        self.signatures[slot] = Some(sig);
        self.update_script();
        Ok(())
    }

    fn estimated_size(&self) -> usize {
        let witness_size = MULTISIG_OPCODES_SIZE
            + self.threshold * MAX_SIGNATURE_SIZE
            + self.public_keys.len() * MAX_PUBKEY_SIZE;
        match self.path {
            MultisigSpendPath::Legacy => INPUT_BASE_SIZE + 3 + witness_size,
            MultisigSpendPath::Witness => {
                INPUT_BASE_SIZE + 1 + div_ceil(witness_size, WITNESS_DISCOUNT)
            }
            MultisigSpendPath::NestedWitness => {
                INPUT_BASE_SIZE
                    + 1
                    + NESTED_PROGRAM_SIZE
                    + div_ceil(witness_size, WITNESS_DISCOUNT)
            }
        }
    }
}

/// A transaction input, tagged by the spending-condition type of the
/// previous output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    /// An input whose previous output script is opaque. Cannot be signed or
    /// verified.
    Unknown(InputBase),
    /// A pay-to-pubkey-hash input (P2PKH, P2WPKH, or nested).
    PublicKeyHash(PkhInput),
    /// A bare pay-to-pubkey input.
    PublicKey(PkInput),
    /// A script-hash multisig input (P2SH, P2WSH, or nested).
    MultiSigScriptHash(MultisigInput),
}

impl Input {
    /// Resolve an input variant from a previous output's locking script.
    /// This is the single dispatch point used when adding an input with
    /// known output info and when rebuilding inputs from object form.
    pub fn resolve(utxo: Utxo) -> TxResult<Self> {
        match utxo.script_pubkey.standard_type() {
            ScriptType::PKH | ScriptType::WPKH | ScriptType::SH => {
                Ok(Input::PublicKeyHash(PkhInput::new(utxo, DEFAULT_SEQUENCE)))
            }
            ScriptType::PK => Ok(Input::PublicKey(PkInput::new(utxo, DEFAULT_SEQUENCE))),
            _ => Err(TransactionError::UnsupportedScriptType(hex::encode(
                utxo.script_pubkey.items(),
            ))),
        }
    }

    /// Resolve a multisig input variant from a previous output's locking
    /// script and the key set that hashes into it. `sort_keys` applies the
    /// conventional lexicographic key ordering before building the redeem
    /// script.
    pub fn resolve_multisig(
        utxo: Utxo,
        public_keys: Vec<Pubkey>,
        threshold: usize,
        sort_keys: bool,
    ) -> TxResult<Self> {
        match utxo.script_pubkey.standard_type() {
            ScriptType::SH | ScriptType::WSH => Ok(Input::MultiSigScriptHash(MultisigInput::new(
                utxo,
                public_keys,
                threshold,
                sort_keys,
                DEFAULT_SEQUENCE,
            )?)),
            _ => Err(TransactionError::UnsupportedScriptType(hex::encode(
                utxo.script_pubkey.items(),
            ))),
        }
    }

    /// Construct an `Unknown` input from wire data.
    pub fn from_wire(txin: BitcoinTxIn) -> Self {
        Input::Unknown(InputBase {
            outpoint: txin.outpoint,
            script_sig: txin.script_sig,
            sequence: txin.sequence,
            witness: vec![],
            utxo: None,
        })
    }

    fn base(&self) -> &InputBase {
        match self {
            Input::Unknown(base) => base,
            Input::PublicKeyHash(input) => &input.base,
            Input::PublicKey(input) => &input.base,
            Input::MultiSigScriptHash(input) => &input.base,
        }
    }

    fn base_mut(&mut self) -> &mut InputBase {
        match self {
            Input::Unknown(base) => base,
            Input::PublicKeyHash(input) => &mut input.base,
            Input::PublicKey(input) => &mut input.base,
            Input::MultiSigScriptHash(input) => &mut input.base,
        }
    }

    /// The outpoint being spent.
    pub fn outpoint(&self) -> BitcoinOutpoint {
        self.base().outpoint
    }

    /// The nSequence field.
    pub fn sequence(&self) -> u32 {
        self.base().sequence
    }

    /// Overwrite the nSequence field.
    pub fn set_sequence(&mut self, sequence: u32) {
        self.base_mut().sequence = sequence;
    }

    /// Set a BIP68 relative time lock: the input is not valid until the
    /// given number of seconds has passed since its prevout confirmed.
    pub fn lock_for_seconds(&mut self, seconds: u32) -> TxResult<&mut Self> {
        if seconds >= SEQUENCE_LOCKTIME_GRANULARITY * SEQUENCE_LOCKTIME_MASK {
            return Err(TransactionError::InvalidArgument(format!(
                "relative lock of {} seconds is out of range",
                seconds
            )));
        }
        let units = seconds / SEQUENCE_LOCKTIME_GRANULARITY;
        self.set_sequence(units | SEQUENCE_LOCKTIME_TYPE_FLAG);
        Ok(self)
    }

    /// Set a BIP68 relative height lock: the input is not valid until the
    /// given number of blocks has been mined on top of its prevout.
    pub fn lock_for_blocks(&mut self, blocks: u32) -> TxResult<&mut Self> {
        if blocks >= SEQUENCE_LOCKTIME_MASK {
            return Err(TransactionError::InvalidArgument(format!(
                "relative lock of {} blocks is out of range",
                blocks
            )));
        }
        self.set_sequence(blocks);
        Ok(self)
    }

    /// The semantic reading of the input's sequence-encoded relative lock.
    /// `None` when relative locks are disabled for this input.
    pub fn relative_lock_time(&self) -> Option<RelativeLockTime> {
        let sequence = self.sequence();
        if sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return None;
        }
        let value = sequence & SEQUENCE_LOCKTIME_MASK;
        if sequence & SEQUENCE_LOCKTIME_TYPE_FLAG != 0 {
            Some(RelativeLockTime::Seconds(value * SEQUENCE_LOCKTIME_GRANULARITY))
        } else {
            Some(RelativeLockTime::Blocks(value))
        }
    }

    /// The previous output information, when known.
    pub fn utxo(&self) -> Option<&Utxo> {
        self.base().utxo.as_ref()
    }

    /// Attach previous output information to the input. Used when the caller
    /// supplies `(outputScript, amount)` explicitly.
    pub fn set_utxo(&mut self, utxo: Utxo) {
        self.base_mut().utxo = Some(utxo);
    }

    /// The current unlocking script.
    pub fn script_sig(&self) -> &ScriptSig {
        &self.base().script_sig
    }

    /// Replace the unlocking script. Used when rebuilding from object form,
    /// where the raw script may already carry signatures.
    pub fn set_script_sig(&mut self, script_sig: ScriptSig) {
        self.base_mut().script_sig = script_sig;
    }

    /// The current witness stack.
    pub fn witness(&self) -> &Witness {
        &self.base().witness
    }

    /// Replace the witness stack. Used when parsing wire data.
    pub fn set_witness(&mut self, witness: Witness) {
        self.base_mut().witness = witness;
    }

    /// True if this input carries witness data.
    pub fn has_witness(&self) -> bool {
        !self.base().witness.is_empty()
    }

    /// True if this input will carry witness data once signed, whether or
    /// not any signatures exist yet. Used for size estimation.
    pub fn expects_witness(&self) -> bool {
        match self {
            Input::Unknown(base) => !base.witness.is_empty(),
            Input::PublicKeyHash(input) => input.path != PkhSpendPath::Legacy,
            Input::PublicKey(_) => false,
            Input::MultiSigScriptHash(input) => input.is_witness(),
        }
    }

    /// True only for the zero-txid, maximal-index coinbase placeholder.
    pub fn is_null(&self) -> bool {
        self.base().outpoint.is_null()
    }

    /// View the input as its wire form.
    pub fn as_wire(&self) -> BitcoinTxIn {
        self.base().as_wire()
    }

    /// The signatures collected on this input so far.
    pub fn signatures(&self) -> Vec<&TransactionSignature> {
        match self {
            Input::Unknown(_) => vec![],
            Input::PublicKeyHash(input) => input.signature.iter().collect(),
            Input::PublicKey(input) => input.signature.iter().collect(),
            Input::MultiSigScriptHash(input) => input.signatures.iter().flatten().collect(),
        }
    }

    /// Remove all signatures and reset the unlocking data.
    pub fn clear_signatures(&mut self) {
        match self {
            Input::Unknown(_) => {}
            Input::PublicKeyHash(input) => {
                input.signature = None;
                input.update_script();
            }
            Input::PublicKey(input) => {
                input.signature = None;
                input.update_script();
            }
            Input::MultiSigScriptHash(input) => {
                input.signatures = vec![None; input.public_keys.len()];
                input.update_script();
            }
        }
    }

    /// Whether the input has collected every signature its script requires.
    /// Fails with `UnableToVerifySignature` on `Unknown` inputs, whose
    /// script kind cannot be executed.
    pub fn is_fully_signed(&self) -> TxResult<bool> {
        match self {
            Input::Unknown(_) => Err(TransactionError::UnableToVerifySignature),
            Input::PublicKeyHash(input) => Ok(input.signature.is_some()),
            Input::PublicKey(input) => Ok(input.signature.is_some()),
            Input::MultiSigScriptHash(input) => {
                Ok(input.count_signatures() == input.threshold)
            }
        }
    }

    /// The estimated wire size of this input once fully signed, with
    /// witness bytes discounted. Used for fee estimation before signatures
    /// exist.
    pub fn estimated_size(&self) -> usize {
        match self {
            Input::Unknown(base) => base.as_wire().serialized_length(),
            Input::PublicKeyHash(input) => input.estimated_size(),
            Input::PublicKey(input) => input.estimated_size(),
            Input::MultiSigScriptHash(input) => input.estimated_size(),
        }
    }

    /// Produce the signatures the given key can contribute to this input.
    /// Returns an empty vector if the key cannot satisfy the input's script.
    pub(crate) fn signatures_for(
        &self,
        tx: &Transaction,
        index: usize,
        privkey: &Privkey,
        sigtype: Sighash,
    ) -> TxResult<Vec<TransactionSignature>> {
        let pubkey = privkey.pubkey();

        let digest = match self {
            Input::Unknown(_) => return Err(TransactionError::UnableToVerifySignature),
            Input::PublicKeyHash(input) => {
                if !input.can_sign(&pubkey) {
                    return Ok(vec![]);
                }
                input.sighash(tx, index, &pubkey, sigtype)?
            }
            Input::PublicKey(input) => {
                if !input.can_sign(&pubkey) {
                    return Ok(vec![]);
                }
                input.sighash(tx, index, sigtype)?
            }
            Input::MultiSigScriptHash(input) => {
                if !input.public_keys.iter().any(|key| key == &pubkey) {
                    return Ok(vec![]);
                }
                input.sighash(tx, index, sigtype)?
            }
        };

        let outpoint = self.outpoint();
        Ok(vec![TransactionSignature {
            public_key: pubkey,
            prev_txid: outpoint.txid,
            output_index: outpoint.idx,
            input_index: index,
            signature: privkey.sign_digest(digest)?,
            sigtype,
        }])
    }

    /// Verify a signature against this input's sighash. Fails with
    /// `UnableToVerifySignature` on `Unknown` inputs rather than returning
    /// false.
    pub(crate) fn is_valid_signature(
        &self,
        tx: &Transaction,
        sig: &TransactionSignature,
    ) -> TxResult<bool> {
        let digest = match self {
            Input::Unknown(_) => return Err(TransactionError::UnableToVerifySignature),
            Input::PublicKeyHash(input) => {
                input.sighash(tx, sig.input_index, &sig.public_key, sig.sigtype)?
            }
            Input::PublicKey(input) => input.sighash(tx, sig.input_index, sig.sigtype)?,
            Input::MultiSigScriptHash(input) => {
                input.sighash(tx, sig.input_index, sig.sigtype)?
            }
        };
        Ok(sig.public_key.verify_digest(digest, &sig.signature))
    }

    /// Record a signature on this input and rebuild its unlocking data.
    pub(crate) fn accept_signature(&mut self, sig: TransactionSignature) -> TxResult<()> {
        match self {
            Input::Unknown(_) => Err(TransactionError::UnableToVerifySignature),
            Input::PublicKeyHash(input) => {
                input.signature = Some(sig);
                input.update_script();
                Ok(())
            }
            Input::PublicKey(input) => {
                input.signature = Some(sig);
                input.update_script();
                Ok(())
            }
            Input::MultiSigScriptHash(input) => input.accept(sig),
        }
    }

    /// The multisig state, if this is a multisig input.
    pub fn as_multisig(&self) -> Option<&MultisigInput> {
        match self {
            Input::MultiSigScriptHash(input) => Some(input),
            _ => None,
        }
    }
}

fn div_ceil(num: usize, div: usize) -> usize {
    (num + div - 1) / div
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hashes::TXID;

    fn key(n: u8) -> Privkey {
        Privkey::from_slice(&[n; 32]).unwrap()
    }

    fn utxo_with_script(script: ScriptPubkey) -> Utxo {
        Utxo::new(BitcoinOutpoint::new(TXID::default(), 0), 100_000, script)
    }

    #[test]
    fn it_resolves_pubkey_hash_variants() {
        let pubkey = key(1).pubkey();

        let legacy = Input::resolve(utxo_with_script(ScriptPubkey::p2pkh(&pubkey.hash160())))
            .unwrap();
        match &legacy {
            Input::PublicKeyHash(input) => assert_eq!(input.path, PkhSpendPath::Legacy),
            other => panic!("expected PKH variant, got {:?}", other),
        }

        let witness = Input::resolve(utxo_with_script(ScriptPubkey::p2wpkh(&pubkey.hash160())))
            .unwrap();
        match &witness {
            Input::PublicKeyHash(input) => assert_eq!(input.path, PkhSpendPath::Witness),
            other => panic!("expected PKH variant, got {:?}", other),
        }

        let program = ScriptPubkey::p2wpkh(&pubkey.hash160());
        let nested = Input::resolve(utxo_with_script(ScriptPubkey::p2sh(&hash160(
            program.items(),
        ))))
        .unwrap();
        match &nested {
            Input::PublicKeyHash(input) => {
                assert_eq!(input.path, PkhSpendPath::NestedWitness);
                assert!(input.can_sign(&pubkey));
            }
            other => panic!("expected PKH variant, got {:?}", other),
        }
    }

    #[test]
    fn it_resolves_pubkey_and_rejects_nonstandard() {
        let pubkey = key(1).pubkey();
        let pk = Input::resolve(utxo_with_script(ScriptPubkey::p2pk(&pubkey.to_array())))
            .unwrap();
        match pk {
            Input::PublicKey(input) => assert!(input.can_sign(&pubkey)),
            other => panic!("expected PK variant, got {:?}", other),
        }

        let junk = ScriptPubkey::new(vec![0xde, 0xad, 0xbe, 0xef]);
        match Input::resolve(utxo_with_script(junk)) {
            Err(TransactionError::UnsupportedScriptType(s)) => {
                assert_eq!(s, "deadbeef")
            }
            other => panic!("expected UnsupportedScriptType, got {:?}", other),
        }
    }

    #[test]
    fn it_rejects_invalid_thresholds() {
        let keys = vec![key(1).pubkey(), key(2).pubkey()];
        let redeem = Script::multisig(2, &[keys[0].to_array(), keys[1].to_array()]);
        let utxo = utxo_with_script(ScriptPubkey::p2sh(&hash160(redeem.items())));

        match Input::resolve_multisig(utxo, keys, 3, false) {
            Err(TransactionError::InvalidThreshold { threshold: 3, keys: 2 }) => {}
            other => panic!("expected InvalidThreshold, got {:?}", other),
        }
    }

    #[test]
    fn it_detects_multisig_spend_paths() {
        let mut keys: Vec<Pubkey> = vec![key(1).pubkey(), key(2).pubkey(), key(3).pubkey()];
        keys.sort_by_key(|k| k.to_array());
        let key_arrays: Vec<[u8; 33]> = keys.iter().map(|k| k.to_array()).collect();
        let redeem = Script::multisig(2, &key_arrays);

        let legacy_utxo = utxo_with_script(ScriptPubkey::p2sh(&hash160(redeem.items())));
        let legacy = Input::resolve_multisig(legacy_utxo, keys.clone(), 2, true).unwrap();
        let ms = legacy.as_multisig().unwrap();
        assert_eq!(ms.path, MultisigSpendPath::Legacy);
        assert_eq!(ms.count_missing_signatures(), 2);

        let wsh_utxo =
            utxo_with_script(ScriptPubkey::p2wsh(&sha256(redeem.items())));
        let witness = Input::resolve_multisig(wsh_utxo, keys.clone(), 2, true).unwrap();
        assert_eq!(witness.as_multisig().unwrap().path, MultisigSpendPath::Witness);

        let program = ScriptPubkey::p2wsh(&sha256(redeem.items()));
        let nested_utxo =
            utxo_with_script(ScriptPubkey::p2sh(&hash160(program.items())));
        let nested = Input::resolve_multisig(nested_utxo, keys.clone(), 2, true).unwrap();
        assert_eq!(
            nested.as_multisig().unwrap().path,
            MultisigSpendPath::NestedWitness
        );
        // the nested scriptSig carries the witness program even before
        // signatures arrive
        assert_eq!(nested.script_sig().len(), 35);

        let wrong_utxo = utxo_with_script(ScriptPubkey::p2sh(&[0xaa; 20]));
        assert!(Input::resolve_multisig(wrong_utxo, keys, 2, true).is_err());
    }

    #[test]
    fn it_fails_completeness_queries_on_unknown_inputs() {
        let input = Input::from_wire(BitcoinTxIn::new(BitcoinOutpoint::null(), vec![], 0));
        match input.is_fully_signed() {
            Err(TransactionError::UnableToVerifySignature) => {}
            other => panic!("expected UnableToVerifySignature, got {:?}", other),
        }
        assert!(input.is_null());
        assert!(input.signatures().is_empty());
    }
}
