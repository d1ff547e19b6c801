//! UTXO struct. Holds the information about a spendable previous output
//! necessary for signing future txns.

use serde::{Deserialize, Serialize};

use crate::{
    enc::encoder::Address,
    hashes::TXID,
    types::{
        script::ScriptPubkey,
        txin::BitcoinOutpoint,
        txout::TxOut,
    },
};

/// Information necessary to spend a previous output: its outpoint, value,
/// and locking script, plus the address form of the script when known.
///
/// A `Utxo` is immutable once constructed. Its identity is its outpoint;
/// two `Utxo`s referencing the same `(txid, index)` pair describe the same
/// spendable coin.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct Utxo {
    /// UTXO outpoint
    pub outpoint: BitcoinOutpoint,
    /// UTXO value
    pub value: u64,
    /// The prevout script pubkey
    pub script_pubkey: ScriptPubkey,
    /// The address encoding of the script pubkey, when one exists
    pub address: Option<Address>,
}

impl Utxo {
    /// Instantiate a new Utxo from its parts.
    pub fn new(outpoint: BitcoinOutpoint, value: u64, script_pubkey: ScriptPubkey) -> Self {
        Utxo {
            outpoint,
            value,
            script_pubkey,
            address: None,
        }
    }

    /// Instantiate a Utxo from the block-explorer (big-endian) txid hex
    /// format, as returned by `listunspent`-style RPCs.
    pub fn from_explorer_format(
        txid_be: &str,
        idx: u32,
        value: u64,
        script_pubkey: ScriptPubkey,
    ) -> Result<Self, txforge_core::ser::SerError> {
        let txid = TXID::from_be_hex(txid_be)?;
        Ok(Utxo::new(BitcoinOutpoint::new(txid, idx), value, script_pubkey))
    }

    /// Attach the address form of the script.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Return a clone of the script pubkey
    pub fn script_pubkey(&self) -> ScriptPubkey {
        self.script_pubkey.clone()
    }

    /// View the UTXO as the output it was created by.
    pub fn as_output(&self) -> TxOut {
        TxOut::new(self.value, self.script_pubkey.clone())
    }
}
