//! # txforge-core
//!
//! `txforge-core` contains the chain-agnostic plumbing used by
//! `txforge-bitcoin`: binary (de)serialization over `std::io::{Read, Write}`,
//! Bitcoin-style VarInt handling, marked digest newtypes, and base58check /
//! bech32 string encodings.
//!
//! ## Crate Layout
//!
//! ### ByteFormat trait
//!
//! The `ByteFormat` trait is a simple serialization API using
//! `std::io::{Read, Write}`. Implementers define the binary wire format of
//! the type. Transaction types must implement `ByteFormat`, as txid logic
//! assumes access to the `write_to` method.
//!
//! `ByteFormat` has an associated `Error` type. Most basic types can simply
//! use the provided `SerError`. More complex (de)serialization will want a
//! custom error type that is easily instantiated from a `SerError` or an
//! `std::io::Error`.
//!
//! ### Hashes
//!
//! The hashes module provides `Write`-based hashers for Bitcoin's
//! double-sha2 and sha2-then-ripemd160 constructions, and a `MarkedDigest`
//! trait for newtyping digests. Marking prevents type confusion between
//! TXIDs, sighashes, and other 32-byte digests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

#[macro_use]
pub mod macros;

pub mod enc;
pub mod hashes;
pub mod ser;

pub mod prelude;
