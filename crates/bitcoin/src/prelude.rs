//! Re-exports of the types needed to build, sign, and serialize
//! transactions.

pub use crate::{
    enc::encoder::Address,
    error::{TransactionError, TxResult},
    hashes::{TXID, WTXID},
    input::Input,
    keys::{Privkey, Pubkey},
    policy::SerializeOpts,
    sighash::Sighash,
    signature::TransactionSignature,
    transaction::{LockTime, Transaction},
    types::{
        script::{Script, ScriptPubkey, ScriptSig, Witness, WitnessStackItem},
        txin::{BitcoinOutpoint, BitcoinTxIn},
        txout::TxOut,
        utxo::Utxo,
    },
};

pub use txforge_core::{
    hashes::{Hash160Digest, Hash256Digest, MarkedDigest},
    ser::ByteFormat,
};

#[cfg(any(feature = "mainnet", feature = "testnet"))]
pub use crate::defaults::network;
