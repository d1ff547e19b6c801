//! # txforge-bitcoin
//!
//! Bitcoin-family transaction construction in Rust: a UTXO-model builder
//! with fee and dust policy, locktime/RBF semantics, BIP69 canonical
//! ordering, per-variant input signing, and the exact legacy and BIP144
//! witness wire formats.
//!
//! The main entry point is [`transaction::Transaction`]:
//!
//! ```ignore
//! use txforge_bitcoin::prelude::*;
//!
//! let mut tx = Transaction::new();
//! tx.spend(utxo)?
//!     .pay(&address, 50_000)?
//!     .change(&change_address)?
//!     .sign(&privkey)?;
//! let raw = tx.serialize()?;
//! ```
//!
//! Serialization is *checked* by default: it runs the full policy ladder
//! (signature completeness, dust, amount sums, fee bounds, size) and each
//! check is individually skippable via [`policy::SerializeOpts`] at the
//! call site. `serialize_hex`/`to_bytes` are the unchecked forms.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod enc;
pub mod error;
pub mod hashes;
pub mod input;
pub mod keys;
pub mod object;
pub mod policy;
pub mod sighash;
pub mod signature;
pub mod transaction;
pub mod types;

#[cfg(any(feature = "mainnet", feature = "testnet"))]
pub mod defaults;

pub mod prelude;
