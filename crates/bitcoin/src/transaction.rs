//! The mutable transaction builder: input/output accumulation, fee and
//! change policy, locktime and RBF semantics, canonical ordering, signing,
//! and wire serialization.
//!
//! The builder mutates in place and returns `&mut Self` for chaining:
//!
//! ```ignore
//! let mut tx = Transaction::new();
//! tx.spend(utxo)?
//!     .pay(&address, 50_000)?
//!     .change(&change_address)?
//!     .sign(&privkey)?;
//! let bytes = tx.serialize()?;
//! ```
//!
//! A `Transaction` is a plain value with no internal locking. Sharing one
//! builder across threads is not supported; build in a single owner, then
//! hand off the serialized bytes.

use std::io::{Read, Write};

use rand::{seq::SliceRandom, Rng};
use txforge_core::{
    hashes::{Hash256Writer, MarkedDigestWriter},
    ser::{self, ByteFormat},
};

use crate::{
    error::{TransactionError, TxResult},
    hashes::{TXID, WTXID},
    input::Input,
    keys::{Privkey, Pubkey},
    policy::{
        SerializeOpts, CURRENT_VERSION, DEFAULT_LOCKTIME_SEQUENCE, DEFAULT_RBF_SEQUENCE,
        DEFAULT_SEQUENCE, DUST_AMOUNT, FEE_PER_KB, FEE_SECURITY_MARGIN, MAX_MONEY,
        MAX_SAFE_SATOSHIS, MAX_TX_SIZE, NLOCKTIME_BLOCKHEIGHT_LIMIT,
    },
    sighash::Sighash,
    signature::TransactionSignature,
    types::{
        script::{ScriptPubkey, Witness},
        txin::BitcoinTxIn,
        txout::TxOut,
        utxo::Utxo,
    },
};

/// The semantic reading of an `nLockTime` value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LockTime {
    /// The transaction is locked until this block height.
    Height(u32),
    /// The transaction is locked until this Unix timestamp.
    Timestamp(u32),
}

/// A Bitcoin transaction under construction: ordered inputs and outputs,
/// version and locktime, and the fee/change policy that will shape the final
/// output list.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub(crate) version: i32,
    pub(crate) inputs: Vec<Input>,
    pub(crate) outputs: Vec<TxOut>,
    pub(crate) nlocktime: u32,
    pub(crate) change_script: Option<ScriptPubkey>,
    pub(crate) change_index: Option<usize>,
    pub(crate) fee: Option<u64>,
    pub(crate) fee_per_kb: Option<u64>,
    pub(crate) fee_per_byte: Option<u64>,
    pub(crate) change_stale: bool,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Instantiate a new empty transaction with the current version and no
    /// locktime.
    pub fn new() -> Self {
        Transaction {
            version: CURRENT_VERSION,
            inputs: vec![],
            outputs: vec![],
            nlocktime: 0,
            change_script: None,
            change_index: None,
            fee: None,
            fee_per_kb: None,
            fee_per_byte: None,
            change_stale: false,
        }
    }

    /// The transaction version.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// The ordered input sequence.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Mutable access to a single input, for sequence-number
    /// customization.
    pub fn input_mut(&mut self, index: usize) -> Option<&mut Input> {
        self.inputs.get_mut(index)
    }

    /// The ordered output sequence.
    pub fn outputs(&self) -> &[TxOut] {
        &self.outputs
    }

    /// The raw nLockTime field.
    pub fn locktime(&self) -> u32 {
        self.nlocktime
    }

    /// The recorded change script, if a change address has been set.
    pub fn change_script(&self) -> Option<&ScriptPubkey> {
        self.change_script.as_ref()
    }

    /// The materialized change output, if one exists.
    pub fn get_change_output(&self) -> Option<&TxOut> {
        self.change_index.map(|i| &self.outputs[i])
    }

    /// The current position of the change output, if one exists.
    pub fn change_index(&self) -> Option<usize> {
        self.change_index
    }

    /// Set the transaction version. Versions above the current version are
    /// rejected.
    pub fn set_version(&mut self, version: i32) -> TxResult<&mut Self> {
        if version < 1 || version > CURRENT_VERSION {
            return Err(TransactionError::InvalidArgument(format!(
                "wrong version number: {}",
                version
            )));
        }
        self.version = version;
        Ok(self)
    }

    /// Set the raw nLockTime field without range interpretation.
    pub fn set_locktime(&mut self, locktime: u32) -> &mut Self {
        self.nlocktime = locktime;
        self
    }

    // ------------------------------------------------------------------
    // Input management
    // ------------------------------------------------------------------

    /// Marks builder state as mutated: the change output must be recomputed
    /// on the next signing pass, and any signatures over the old shape are
    /// no longer valid.
    fn touch(&mut self) {
        self.change_stale = true;
        if self.change_script.is_some() {
            self.clear_signatures();
        }
    }

    /// Spend a previous output. Resolves the input variant from the output's
    /// locking script. Re-adding an outpoint that is already spent by this
    /// transaction is a no-op.
    pub fn spend(&mut self, utxo: Utxo) -> TxResult<&mut Self> {
        if self.spends(&utxo) {
            return Ok(self);
        }
        let input = Input::resolve(utxo)?;
        self.unchecked_add_input(input);
        Ok(self)
    }

    /// Spend a batch of previous outputs.
    pub fn spend_many<I: IntoIterator<Item = Utxo>>(&mut self, utxos: I) -> TxResult<&mut Self> {
        for utxo in utxos {
            self.spend(utxo)?;
        }
        Ok(self)
    }

    /// Spend a multisig previous output, providing the public key set and
    /// signature threshold that hash into its script. Keys are sorted
    /// lexicographically before the redeem script is built.
    pub fn spend_multisig(
        &mut self,
        utxo: Utxo,
        public_keys: Vec<Pubkey>,
        threshold: usize,
    ) -> TxResult<&mut Self> {
        if self.spends(&utxo) {
            return Ok(self);
        }
        let input = Input::resolve_multisig(utxo, public_keys, threshold, true)?;
        self.unchecked_add_input(input);
        Ok(self)
    }

    fn spends(&self, utxo: &Utxo) -> bool {
        self.inputs.iter().any(|i| i.outpoint() == utxo.outpoint)
    }

    /// Add a pre-constructed input. The input must carry previous-output
    /// information, or the call fails with `NeedMoreInfo`.
    pub fn add_input(&mut self, input: Input) -> TxResult<&mut Self> {
        if input.utxo().is_none() {
            return Err(TransactionError::NeedMoreInfo(
                "need information about the UTXO script and satoshis".to_owned(),
            ));
        }
        if self.inputs.iter().any(|i| i.outpoint() == input.outpoint()) {
            return Ok(self);
        }
        self.unchecked_add_input(input);
        Ok(self)
    }

    /// Add a pre-constructed input, supplying the previous output's script
    /// and amount explicitly.
    pub fn add_input_with_info(
        &mut self,
        mut input: Input,
        output_script: ScriptPubkey,
        value: u64,
    ) -> TxResult<&mut Self> {
        if input.utxo().is_none() {
            input.set_utxo(Utxo::new(input.outpoint(), value, output_script));
        }
        self.add_input(input)
    }

    /// Add an input without checking that it carries previous-output
    /// information. Used when rebuilding parsed transactions.
    pub fn unchecked_add_input(&mut self, input: Input) -> &mut Self {
        self.inputs.push(input);
        self.touch();
        self
    }

    /// Remove the input at the given index.
    pub fn remove_input(&mut self, index: usize) -> TxResult<&mut Self> {
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                length: self.inputs.len(),
            });
        }
        self.inputs.remove(index);
        self.touch();
        Ok(self)
    }

    /// Remove the input spending the given previous output.
    pub fn remove_input_outpoint(&mut self, txid: &TXID, idx: u32) -> TxResult<&mut Self> {
        let position = self
            .inputs
            .iter()
            .position(|i| i.outpoint().txid == *txid && i.outpoint().idx == idx);
        match position {
            Some(index) => self.remove_input(index),
            None => Err(TransactionError::InvalidArgument(format!(
                "no input spends {}:{}",
                txid.to_be_hex(),
                idx
            ))),
        }
    }

    /// True if every input carries previous-output information.
    pub fn has_all_utxo_info(&self) -> bool {
        self.inputs.iter().all(|i| i.utxo().is_some())
    }

    // ------------------------------------------------------------------
    // Output management
    // ------------------------------------------------------------------

    /// Add an output paying `value` to `script_pubkey`.
    pub fn pay_script_pubkey(&mut self, value: u64, script_pubkey: ScriptPubkey) -> TxResult<&mut Self> {
        if value == 0 || value > MAX_MONEY {
            return Err(TransactionError::InvalidAmount(value));
        }
        self.add_output(TxOut::new(value, script_pubkey));
        Ok(self)
    }

    /// Add an OP_RETURN output carrying `data`. Exempt from the dust check
    /// by design.
    pub fn add_data(&mut self, data: &[u8]) -> &mut Self {
        self.add_output(TxOut::op_return(data));
        self
    }

    /// Add a fully-formed output.
    pub fn add_output(&mut self, output: TxOut) -> &mut Self {
        self.outputs.push(output);
        self.touch();
        self
    }

    /// Remove the output at the given index.
    pub fn remove_output(&mut self, index: usize) -> TxResult<&mut Self> {
        if index >= self.outputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                length: self.outputs.len(),
            });
        }
        self.outputs.remove(index);
        match self.change_index {
            Some(ci) if ci == index => self.change_index = None,
            Some(ci) if ci > index => self.change_index = Some(ci - 1),
            _ => {}
        }
        self.touch();
        Ok(self)
    }

    /// Remove all outputs.
    pub fn clear_outputs(&mut self) -> &mut Self {
        self.outputs.clear();
        self.change_index = None;
        self.touch();
        self
    }

    // ------------------------------------------------------------------
    // Amounts, fee, and change
    // ------------------------------------------------------------------

    /// The sum of all input amounts. Fails with
    /// `MissingPreviousOutputInfo` if any input was constructed from raw
    /// bytes only.
    pub fn input_amount(&self) -> TxResult<u64> {
        let mut total = 0u64;
        for input in self.inputs.iter() {
            let utxo = input
                .utxo()
                .ok_or(TransactionError::MissingPreviousOutputInfo)?;
            total += utxo.value;
        }
        Ok(total)
    }

    /// The sum of all output amounts.
    pub fn output_amount(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Manually set the fee for this transaction.
    pub fn fee(&mut self, amount: u64) -> &mut Self {
        self.fee = Some(amount);
        self.touch();
        self
    }

    /// Set the fee rate in satoshis per kilobyte.
    pub fn fee_per_kb(&mut self, amount: u64) -> &mut Self {
        self.fee_per_kb = Some(amount);
        self.touch();
        self
    }

    /// Set the fee rate in satoshis per byte. Ignored if a per-KB rate is
    /// also set.
    pub fn fee_per_byte(&mut self, amount: u64) -> &mut Self {
        self.fee_per_byte = Some(amount);
        self.touch();
        self
    }

    /// Record a change script directly. The change output itself is
    /// computed lazily, on the next signing pass.
    pub fn change_script_pubkey(&mut self, script: ScriptPubkey) -> &mut Self {
        self.change_script = Some(script);
        self.touch();
        self
    }

    /// Calculates the fee of the transaction.
    ///
    /// If there's a fixed fee set, return that. If no change address is
    /// set, the fee is the total value of the inputs minus the outputs.
    /// Otherwise, estimate the fee from the serialized size. A coinbase
    /// transaction has no fee.
    pub fn get_fee(&self) -> TxResult<u64> {
        if self.is_coinbase() {
            return Ok(0);
        }
        if let Some(fee) = self.fee {
            return Ok(fee);
        }
        if self.change_script.is_none() {
            let unspent =
                self.input_amount()? as i128 - self.output_amount() as i128;
            return Ok(unspent.max(0) as u64);
        }
        self.estimate_fee()
    }

    fn scale_fee(&self, size: u64) -> u64 {
        if let Some(per_byte) = self.fee_per_byte {
            return size * per_byte;
        }
        let per_kb = self.fee_per_kb.unwrap_or(FEE_PER_KB);
        (size * per_kb + 999) / 1000
    }

    /// Estimates the fee from the serialized transaction size in bytes,
    /// accounting for the change output about to be added when the
    /// remaining value can cover it.
    pub fn estimate_fee(&self) -> TxResult<u64> {
        let size = self.estimate_size() as u64;
        let fee = self.scale_fee(size);
        if self.change_script.is_none() {
            return Ok(fee);
        }
        let fee_with_change =
            fee + self.scale_fee(self.estimate_size_of_change_output() as u64);
        let available = self.input_amount()? as i128 - self.output_amount() as i128;
        if available <= fee_with_change as i128 {
            Ok(fee)
        } else {
            Ok(fee_with_change)
        }
    }

    fn estimate_size_of_change_output(&self) -> usize {
        match &self.change_script {
            None => 0,
            Some(script) => {
                8 + ser::prefix_byte_len(script.len() as u64) as usize + script.len()
            }
        }
    }

    /// Estimate the serialized size before input signatures are added,
    /// using placeholder signature sizes per input variant.
    pub fn estimate_size(&self) -> usize {
        let mut result = 4; // version
        if self.expects_witnesses() {
            result += 1; // marker and flag, discounted
        }

        result += ser::prefix_byte_len(self.inputs.len() as u64) as usize;
        for input in self.inputs.iter() {
            result += input.estimated_size();
        }

        result += ser::prefix_byte_len(self.outputs.len() as u64) as usize;
        for output in self.outputs.iter() {
            result += output.serialized_length();
        }

        result += 4; // nLockTime
        result
    }

    fn expects_witnesses(&self) -> bool {
        self.inputs.iter().any(|i| i.expects_witness())
    }

    /// Recompute the change output from the current inputs, outputs, and
    /// fee policy. Removes any previously materialized change output first.
    /// Change below the dust threshold is absorbed into the fee.
    fn update_change_output(&mut self) -> TxResult<()> {
        let change_script = match &self.change_script {
            Some(script) => script.clone(),
            None => return Ok(()),
        };
        self.clear_signatures();
        if let Some(ci) = self.change_index.take() {
            self.outputs.remove(ci);
        }
        let available = self.input_amount()? as i128 - self.output_amount() as i128;
        let fee = match self.fee {
            Some(fee) => fee,
            None => self.estimate_fee()?,
        };
        let change = available - fee as i128;
        if change >= DUST_AMOUNT as i128 {
            self.change_index = Some(self.outputs.len());
            self.outputs.push(TxOut::new(change as u64, change_script));
        } else {
            self.change_index = None;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Locktime, sequence, RBF
    // ------------------------------------------------------------------

    /// Force locktime enforcement by moving still-final input sequence
    /// numbers off the maximal value.
    fn enforce_locktime_sequences(&mut self) {
        for input in self.inputs.iter_mut() {
            if input.sequence() == DEFAULT_SEQUENCE {
                input.set_sequence(DEFAULT_LOCKTIME_SEQUENCE);
            }
        }
    }

    /// Sets nLockTime so that the transaction is not valid until the
    /// desired block height.
    pub fn lock_until_block_height(&mut self, height: i64) -> TxResult<&mut Self> {
        if height < 0 {
            return Err(TransactionError::NegativeLockTime(height));
        }
        if height >= NLOCKTIME_BLOCKHEIGHT_LIMIT as i64 {
            return Err(TransactionError::BlockHeightTooHigh(height));
        }
        self.enforce_locktime_sequences();
        self.nlocktime = height as u32;
        Ok(self)
    }

    /// Sets nLockTime so that the transaction is not valid until the
    /// desired date, given as a Unix timestamp in seconds.
    pub fn lock_until_date(&mut self, timestamp: i64) -> TxResult<&mut Self> {
        if timestamp < NLOCKTIME_BLOCKHEIGHT_LIMIT as i64 {
            return Err(TransactionError::LockTimeTooEarly(timestamp));
        }
        if timestamp > u32::MAX as i64 {
            return Err(TransactionError::InvalidArgument(format!(
                "locktime {} does not fit in 32 bits",
                timestamp
            )));
        }
        self.enforce_locktime_sequences();
        self.nlocktime = timestamp as u32;
        Ok(self)
    }

    /// Returns the semantic reading of nLockTime: `None` when unset, a
    /// block height below the threshold, a timestamp at or above it.
    pub fn lock_time(&self) -> Option<LockTime> {
        if self.nlocktime == 0 {
            return None;
        }
        if self.nlocktime < NLOCKTIME_BLOCKHEIGHT_LIMIT {
            Some(LockTime::Height(self.nlocktime))
        } else {
            Some(LockTime::Timestamp(self.nlocktime))
        }
    }

    /// Opt in to BIP125 replace-by-fee by lowering the sequence number of
    /// every input that does not already signal it. Inputs customized to a
    /// smaller sequence are left untouched.
    pub fn enable_rbf(&mut self) -> &mut Self {
        for input in self.inputs.iter_mut() {
            if input.sequence() >= DEFAULT_LOCKTIME_SEQUENCE {
                input.set_sequence(DEFAULT_RBF_SEQUENCE);
            }
        }
        self
    }

    /// True if this transaction signals BIP125 replaceability.
    pub fn is_rbf(&self) -> bool {
        self.inputs
            .iter()
            .any(|i| i.sequence() <= DEFAULT_RBF_SEQUENCE)
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    /// Sort inputs and outputs according to BIP69: inputs by (txid, index),
    /// outputs by (amount, script). Clears all signatures, as the sighash
    /// commits to input order.
    pub fn sort(&mut self) -> TxResult<&mut Self> {
        self.sort_inputs(|inputs| {
            let mut sorted = inputs.to_vec();
            sorted.sort_by(|a, b| {
                let key_a = (a.outpoint().txid.to_be_hex(), a.outpoint().idx);
                let key_b = (b.outpoint().txid.to_be_hex(), b.outpoint().idx);
                key_a.cmp(&key_b)
            });
            sorted
        });
        self.sort_outputs(|outputs| {
            let mut sorted = outputs.to_vec();
            sorted.sort_by(|a, b| {
                (a.value, a.script_pubkey.items()).cmp(&(b.value, b.script_pubkey.items()))
            });
            sorted
        })?;
        Ok(self)
    }

    /// Reorder inputs with a caller-supplied function. Clears all
    /// signatures.
    pub fn sort_inputs<F>(&mut self, sorting: F) -> &mut Self
    where
        F: FnOnce(&[Input]) -> Vec<Input>,
    {
        self.inputs = sorting(&self.inputs);
        self.clear_signatures();
        self
    }

    /// Reorder outputs with a caller-supplied function. The result must be
    /// a permutation of the current outputs, or the call fails with
    /// `InvalidSorting`. The change index is updated to track the change
    /// output's new position.
    pub fn sort_outputs<F>(&mut self, sorting: F) -> TxResult<&mut Self>
    where
        F: FnOnce(&[TxOut]) -> Vec<TxOut>,
    {
        let new_outputs = sorting(&self.outputs);
        self.apply_output_order(new_outputs)
    }

    /// Randomly permute the output order. The caller supplies the
    /// randomness source, which keeps the operation deterministic under
    /// test. Safe to call when no change output exists.
    pub fn shuffle_outputs<R: Rng>(&mut self, rng: &mut R) -> TxResult<&mut Self> {
        let mut shuffled = self.outputs.clone();
        shuffled.shuffle(rng);
        self.apply_output_order(shuffled)
    }

    fn apply_output_order(&mut self, new_outputs: Vec<TxOut>) -> TxResult<&mut Self> {
        if new_outputs.len() != self.outputs.len() {
            return Err(TransactionError::InvalidSorting);
        }
        let mut unmatched = new_outputs.clone();
        for output in self.outputs.iter() {
            match unmatched.iter().position(|o| o == output) {
                Some(i) => {
                    unmatched.remove(i);
                }
                None => return Err(TransactionError::InvalidSorting),
            }
        }

        if let Some(ci) = self.change_index {
            let change = self.outputs[ci].clone();
            self.change_index = new_outputs.iter().position(|o| *o == change);
        }
        self.outputs = new_outputs;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Signing
    // ------------------------------------------------------------------

    /// True if this is a coinbase transaction: exactly one input, spending
    /// the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_null()
    }

    /// Remove all signatures from all inputs.
    pub fn clear_signatures(&mut self) {
        for input in self.inputs.iter_mut() {
            input.clear_signatures();
        }
    }

    /// Sign every input the key can satisfy, with SIGHASH_ALL.
    pub fn sign(&mut self, privkey: &Privkey) -> TxResult<&mut Self> {
        self.sign_with(privkey, Sighash::All)
    }

    /// Sign every input the key can satisfy, with the given sighash mode.
    ///
    /// The first signing pass after a mutation materializes the change
    /// output; further passes leave it untouched, so repeated signing is
    /// idempotent.
    pub fn sign_with(&mut self, privkey: &Privkey, sigtype: Sighash) -> TxResult<&mut Self> {
        if !self.has_all_utxo_info() {
            return Err(TransactionError::NeedMoreInfo(
                "not all utxo information is available to sign the transaction".to_owned(),
            ));
        }
        if self.change_stale {
            self.update_change_output()?;
            self.change_stale = false;
        }
        for signature in self.get_signatures(privkey, sigtype)? {
            self.apply_signature(signature)?;
        }
        Ok(self)
    }

    /// Sign with several keys in order.
    pub fn sign_many(&mut self, privkeys: &[Privkey]) -> TxResult<&mut Self> {
        for key in privkeys {
            self.sign(key)?;
        }
        Ok(self)
    }

    /// Compute, without applying, every signature the key can contribute.
    pub fn get_signatures(
        &self,
        privkey: &Privkey,
        sigtype: Sighash,
    ) -> TxResult<Vec<TransactionSignature>> {
        let mut results = vec![];
        for (index, input) in self.inputs.iter().enumerate() {
            results.extend(input.signatures_for(self, index, privkey, sigtype)?);
        }
        Ok(results)
    }

    /// Validate a signature against its input's sighash and record it,
    /// rebuilding that input's unlocking data.
    pub fn apply_signature(&mut self, signature: TransactionSignature) -> TxResult<&mut Self> {
        let index = signature.input_index;
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                length: self.inputs.len(),
            });
        }
        if !self.inputs[index].is_valid_signature(self, &signature)? {
            return Err(TransactionError::BadSignature(
                "signature does not verify against its input's sighash".to_owned(),
            ));
        }
        self.inputs[index].accept_signature(signature)?;
        Ok(self)
    }

    /// True if a signature verifies against its input's sighash. Fails with
    /// `UnableToVerifySignature` when the input's script kind is unknown.
    pub fn is_valid_signature(&self, signature: &TransactionSignature) -> TxResult<bool> {
        let index = signature.input_index;
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                length: self.inputs.len(),
            });
        }
        self.inputs[index].is_valid_signature(self, signature)
    }

    /// True if every input has collected all the signatures its script
    /// requires. Fails with `UnableToVerifySignature` if any input's script
    /// kind is unknown.
    pub fn is_fully_signed(&self) -> TxResult<bool> {
        for input in self.inputs.iter() {
            if !input.is_fully_signed()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// True if any input carries witness data.
    pub fn has_witnesses(&self) -> bool {
        self.inputs.iter().any(|i| i.has_witness())
    }

    /// Serialize to bytes. When `no_witness` is set, the marker, flag, and
    /// witness fields are omitted; this is the form the transaction id
    /// commits to.
    pub fn to_bytes(&self, no_witness: bool) -> Vec<u8> {
        let mut buf = vec![];
        self.write_wire(&mut buf, no_witness)
            .expect("no IOError writing to a vec");
        buf
    }

    fn write_wire<W: Write>(&self, writer: &mut W, no_witness: bool) -> TxResult<usize> {
        let has_witnesses = !no_witness && self.has_witnesses();

        let mut len = Self::write_u32_le(writer, self.version as u32)?;
        if has_witnesses {
            len += writer.write(&[0u8, 1u8])?;
        }

        let vin: Vec<BitcoinTxIn> = self.inputs.iter().map(|i| i.as_wire()).collect();
        len += Self::write_prefix_vec(writer, &vin)?;
        len += Self::write_prefix_vec(writer, &self.outputs)?;

        if has_witnesses {
            for input in self.inputs.iter() {
                len += Self::write_prefix_vec(writer, input.witness())?;
            }
        }

        len += Self::write_u32_le(writer, self.nlocktime)?;
        Ok(len)
    }

    /// The transaction id: the double-SHA256 of the serialization without
    /// marker, flag, or witness fields.
    pub fn txid(&self) -> TXID {
        let mut w = Hash256Writer::default();
        self.write_wire(&mut w, true)
            .expect("no IOError from SHA2");
        w.finish_marked()
    }

    /// The witness transaction id: the double-SHA256 of the full
    /// serialization.
    pub fn wtxid(&self) -> WTXID {
        let mut w = Hash256Writer::default();
        self.write_wire(&mut w, false)
            .expect("no IOError from SHA2");
        w.finish_marked()
    }

    /// The serialized size in bytes, including witness data.
    pub fn size(&self) -> usize {
        self.to_bytes(false).len()
    }

    /// The BIP141 weight: three times the stripped size plus the total
    /// size.
    pub fn weight(&self) -> usize {
        self.to_bytes(true).len() * 3 + self.to_bytes(false).len()
    }

    /// The virtual size: weight divided by four, rounded up.
    pub fn vsize(&self) -> usize {
        (self.weight() + 3) / 4
    }

    /// Serialize after running the full validation ladder with default
    /// options.
    pub fn serialize(&self) -> TxResult<Vec<u8>> {
        self.checked_serialize(&SerializeOpts::default())
    }

    /// Serialize after running the validation ladder. Each check can be
    /// individually skipped via `opts`. The ladder runs, in order: amount
    /// corruption, signature completeness, dust outputs, output-sum
    /// vs. input-sum, declared-fee mismatch, fee bounds (raising
    /// `ChangeAddressMissing` when an oversized fee could have been change),
    /// and maximum transaction size.
    pub fn checked_serialize(&self, opts: &SerializeOpts) -> TxResult<Vec<u8>> {
        if opts.disable_all {
            return Ok(self.to_bytes(false));
        }

        for output in self.outputs.iter() {
            if output.value > MAX_SAFE_SATOSHIS {
                return Err(TransactionError::InvalidSatoshis(output.value));
            }
        }

        if !opts.disable_is_fully_signed && !self.is_fully_signed()? {
            return Err(TransactionError::MissingSignatures);
        }

        if !opts.disable_dust_outputs && self.outputs.iter().any(|o| o.is_dust()) {
            return Err(TransactionError::DustOutputs);
        }

        let input_amount = self.input_amount()?;
        let output_amount = self.output_amount();

        if output_amount > input_amount {
            if !opts.disable_more_output_than_input {
                return Err(TransactionError::InvalidOutputAmountSum {
                    inputs: input_amount,
                    outputs: output_amount,
                });
            }
        } else {
            let unspent = input_amount - output_amount;

            if let Some(declared) = self.fee {
                if declared != unspent {
                    return Err(TransactionError::FeeDifferentThanDeclared {
                        declared,
                        unspent,
                    });
                }
            }

            if !opts.disable_large_fees {
                let max = FEE_SECURITY_MARGIN.saturating_mul(self.estimate_fee()?);
                if unspent > max {
                    if self.change_script.is_none() {
                        return Err(TransactionError::ChangeAddressMissing);
                    }
                    return Err(TransactionError::FeeTooLarge { max, got: unspent });
                }
            }

            if !opts.disable_small_fees {
                let estimated = self.estimate_fee()?;
                let min = (estimated + FEE_SECURITY_MARGIN - 1) / FEE_SECURITY_MARGIN;
                if unspent < min {
                    return Err(TransactionError::FeeTooSmall { min, got: unspent });
                }
            }
        }

        let bytes = self.to_bytes(false);
        if bytes.len() > MAX_TX_SIZE {
            return Err(TransactionError::ExceedsMaxBlockSize(bytes.len()));
        }
        Ok(bytes)
    }

    /// A non-throwing diagnostic pass, containing the same logic as
    /// `CheckTransaction` in bitcoin core. Returns a human-readable
    /// description of the first problem found.
    pub fn verify(&self) -> Result<(), String> {
        if self.inputs.is_empty() {
            return Err("transaction txins empty".to_owned());
        }
        if self.outputs.is_empty() {
            return Err("transaction txouts empty".to_owned());
        }

        // Check for negative or overflow output values
        let mut value_out: u128 = 0;
        for (i, output) in self.outputs.iter().enumerate() {
            if output.value > MAX_SAFE_SATOSHIS {
                return Err(format!("transaction txout {} satoshis is invalid", i));
            }
            if output.value > MAX_MONEY {
                return Err(format!("transaction txout {} greater than MAX_MONEY", i));
            }
            value_out += output.value as u128;
            if value_out > MAX_MONEY as u128 {
                return Err(format!(
                    "transaction txout {} total output greater than MAX_MONEY",
                    i
                ));
            }
        }

        // Size limits
        if self.to_bytes(false).len() > MAX_TX_SIZE {
            return Err("transaction over the maximum block size".to_owned());
        }

        // Check for duplicate inputs
        let mut seen = std::collections::HashSet::new();
        for (i, input) in self.inputs.iter().enumerate() {
            if !seen.insert(input.outpoint()) {
                return Err(format!("transaction input {} duplicate input", i));
            }
        }

        if self.is_coinbase() {
            let script_len = self.inputs[0].script_sig().len();
            if !(2..=100).contains(&script_len) {
                return Err("coinbase transaction script size invalid".to_owned());
            }
        } else {
            for (i, input) in self.inputs.iter().enumerate() {
                if input.is_null() {
                    return Err(format!("transaction input {} has null input", i));
                }
            }
        }
        Ok(())
    }
}

impl ByteFormat for Transaction {
    type Error = TransactionError;

    fn serialized_length(&self) -> usize {
        let has_witnesses = self.has_witnesses();
        let mut len = 4; // version
        if has_witnesses {
            len += 2; // marker and flag
        }
        len += ser::prefix_byte_len(self.inputs.len() as u64) as usize;
        for input in self.inputs.iter() {
            len += input.as_wire().serialized_length();
        }
        len += ser::prefix_byte_len(self.outputs.len() as u64) as usize;
        for output in self.outputs.iter() {
            len += output.serialized_length();
        }
        if has_witnesses {
            for input in self.inputs.iter() {
                len += ser::prefix_byte_len(input.witness().len() as u64) as usize;
                len += input.witness().serialized_length();
            }
        }
        len += 4; // locktime
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let version = Self::read_u32_le(reader)? as i32;

        let mut count = ser::read_compact_int(reader)?;
        let mut has_witnesses = false;
        if count == 0 {
            // Either the segwit marker, or a transaction with no inputs.
            let flag = Self::read_u8(reader)?;
            match flag {
                0x01 => {
                    has_witnesses = true;
                    count = ser::read_compact_int(reader)?;
                }
                0x00 => {
                    // No inputs and no outputs; the byte was the output
                    // count.
                    let nlocktime = Self::read_u32_le(reader)?;
                    let mut tx = Transaction::new();
                    tx.version = version;
                    tx.nlocktime = nlocktime;
                    return Ok(tx);
                }
                other => return Err(TransactionError::BadWitnessFlag([0, other])),
            }
        }

        let mut inputs = vec![];
        for _ in 0..count {
            inputs.push(Input::from_wire(BitcoinTxIn::read_from(reader, 0)?));
        }

        let outputs: Vec<TxOut> = Self::read_prefix_vec(reader)?;

        if has_witnesses {
            for input in inputs.iter_mut() {
                let witness: Witness = Self::read_prefix_vec(reader)?;
                input.set_witness(witness);
            }
        }

        let nlocktime = Self::read_u32_le(reader)?;

        let mut tx = Transaction::new();
        tx.version = version;
        tx.inputs = inputs;
        tx.outputs = outputs;
        tx.nlocktime = nlocktime;
        Ok(tx)
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        self.write_wire(writer, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // BIP144 example transaction from the original library's test corpus.
    const SEGWIT_TX_HEX: &str = "01000000000101b0e5caa7e37d4b8530c3e1071a36dd5e05d1065cf7224ddff42c69e3387689870000000000ffffffff017b911100000000001600144ff831574da8bef07f8bc97244a1666147b071570247304402203fcbcfddbd6ca3a90252610dd63f1be50b2d926b8d87c912da0a3e42bb03fba002202a90c8aad75da22b0549c72618b754114583e934c0b0d2ccd6c13fcd859ba4ed01210363f3f47f4555779de405eab8d0dc8c2a4f3e09f4171a3fa47c7a77715795319800000000";

    #[test]
    fn it_round_trips_segwit_transactions() {
        let tx = Transaction::deserialize_hex(SEGWIT_TX_HEX).unwrap();
        assert!(tx.has_witnesses());
        assert_eq!(tx.inputs().len(), 1);
        assert_eq!(tx.outputs().len(), 1);
        assert_eq!(tx.serialize_hex(), SEGWIT_TX_HEX);
        assert_eq!(tx.serialized_length(), SEGWIT_TX_HEX.len() / 2);
    }

    #[test]
    fn it_computes_segwit_txids() {
        let tx = Transaction::deserialize_hex(SEGWIT_TX_HEX).unwrap();
        assert_eq!(
            tx.txid().to_be_hex(),
            "7f1a2d46746f1bfbb22ab797d5aad1fd9723477b417fa34dff73d8a7dbb14570"
        );
        assert_eq!(
            tx.wtxid().to_be_hex(),
            "3c26fc8b5cfe65f96d955cecfe4d11db2659d052171f9f31af043e9f5073e46b"
        );
    }

    #[test]
    fn it_round_trips_nested_witness_p2sh() {
        let tx_hex = "010000000001010894bb2bbfd5249b1c55f7bc64352bb64894938bc6439f43f28a58bfa7c73205000000002322002077b16b966ee6a4b8a0901351221d279afd31d3f90df52a3fc53436ea9abde5b0ffffffff01010000000000000000030047304402200fa23efa9a8d6ae285cfc82f81e6c2196d14167553b10da1845abd2c9fe38dc502207a40a58ee5b739e902b275018dfa1bee0d608736ff4317b028fbc29391f4554f01475221037b8dc5861a0ef7b0a97b41d2d1e27186f019d4834dbc99f24952b6f5080f5cce21027152378182102b68b5fce42f9f365ec272c48afda6b0816e735c1dc4b96dd45a52ae00000000";
        let tx = Transaction::deserialize_hex(tx_hex).unwrap();
        assert_eq!(tx.serialize_hex(), tx_hex);
    }

    #[test]
    fn it_round_trips_legacy_transactions() {
        let tx_hex = "0100000001813f79011acb80925dfe69b3def355fe914bd1d96a3f5f71bf8303c6a989c7d1000000006b483045022100ed81ff192e75a3fd2304004dcadb746fa5e24c5031ccfcf21320b0277457c98f02207a986d955c6e0cb35d446a89d3f56100f4d7f67801c31967743a9c8e10615bed01210349fc4e631e3624a545de3f89f5d8684c7b8138bd94bdd531d2e213bf016b278afeffffff02a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac99c39800000000001976a9141c4bc762dd5423e332166702cb75f40df79fea1288ac19430600";
        let tx = Transaction::deserialize_hex(tx_hex).unwrap();
        assert!(!tx.has_witnesses());
        assert_eq!(tx.serialize_hex(), tx_hex);
        assert_eq!(tx.serialized_length(), tx_hex.len() / 2);
        // txid of a legacy tx equals its wtxid
        assert_eq!(tx.txid().0, tx.wtxid().0);
    }

    #[test]
    fn it_identifies_segwit_transactions_by_marker() {
        // https://github.com/bitcoin/bips/blob/master/bip-0144.mediawiki
        let tx_hex = "010000000001012052cda8bc0c2cb743f154881fc85cb675527dcf2f7a5938241020c33341b3f70000000000ffffffff00010000000000";
        let tx = Transaction::deserialize_hex(tx_hex).unwrap();
        assert!(tx.has_witnesses());
        assert_eq!(tx.inputs().len(), 1);
        assert_eq!(tx.outputs().len(), 0);
        assert_eq!(tx.serialize_hex(), tx_hex);
    }

    #[test]
    fn it_parses_sequence_and_locktime_fields() {
        let tx = Transaction::deserialize_hex(SEGWIT_TX_HEX).unwrap();
        assert_eq!(tx.inputs()[0].sequence(), 0xffff_ffff);
        assert_eq!(tx.locktime(), 0);
        assert_eq!(tx.lock_time(), None);
    }

    #[test]
    fn it_reads_locktime_semantics() {
        let mut tx = Transaction::new();
        assert_eq!(tx.lock_time(), None);
        tx.set_locktime(400_000);
        assert_eq!(tx.lock_time(), Some(LockTime::Height(400_000)));
        tx.set_locktime(1_600_000_000);
        assert_eq!(tx.lock_time(), Some(LockTime::Timestamp(1_600_000_000)));
    }
}
