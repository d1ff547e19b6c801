//! Utilities for working with cryptographic digests, and disambiguating
//! digests via marker traits.
//!
//! We wrap hashes in marked newtypes in order to prevent type-confusion
//! between TXIDs, sighashes, and other digests of the same length.

use std::io::{Result as IOResult, Write};

use digest::Digest;
use ripemd::Ripemd160;
use sha2::Sha256;

/// Output of Bitcoin's double-SHA256.
pub type Hash256Digest = [u8; 32];

/// Output of Bitcoin's SHA256-then-RIPEMD160 ("hash160").
pub type Hash160Digest = [u8; 20];

/// A digest newtyped for a specific purpose (e.g. a TXID), to prevent
/// type confusion with other digests of the same width.
pub trait MarkedDigest: Default + Copy {
    /// The underlying digest type.
    type Digest;

    /// Wrap a digest in the marked type.
    fn new(hash: Self::Digest) -> Self;

    /// Return a copy of the internal digest.
    fn internal(&self) -> Self::Digest;

    /// Return the digest bytes as a vector.
    fn bytes(&self) -> Vec<u8>;

    /// Return a marked digest with the byte order reversed. Bitcoin tools
    /// display txids in the reverse of their in-protocol byte order.
    fn reversed(&self) -> Self
    where
        Self: Sized;
}

/// An `io::Write` that accumulates input and produces a digest of type `D`
/// when finished.
pub trait MarkedDigestWriter<D>: Default + Write {
    /// Consume the writer, producing the digest.
    fn finish(self) -> D;

    /// Consume the writer, producing a `MarkedDigest` wrapping the digest.
    fn finish_marked<M: MarkedDigest<Digest = D>>(self) -> M
    where
        Self: Sized,
    {
        M::new(self.finish())
    }
}

/// A struct that exposes a Bitcoin-style Hash256 `Write` interface by
/// wrapping an internal SHA2 instance.
#[derive(Default)]
pub struct Hash256Writer {
    internal: Sha256,
}

impl Write for Hash256Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.update(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<Hash256Digest> for Hash256Writer {
    fn finish(self) -> Hash256Digest {
        let first = self.internal.finalize();
        let second = Sha256::digest(first);
        let mut digest = Hash256Digest::default();
        digest[..].copy_from_slice(&second[..]);
        digest
    }
}

/// A struct that exposes a Bitcoin-style Hash160 `Write` interface by
/// wrapping an internal SHA2 instance.
#[derive(Default)]
pub struct Hash160Writer {
    internal: Sha256,
}

impl Write for Hash160Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.update(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<Hash160Digest> for Hash160Writer {
    fn finish(self) -> Hash160Digest {
        let sha = self.internal.finalize();
        let rmd = Ripemd160::digest(sha);
        let mut digest = Hash160Digest::default();
        digest[..].copy_from_slice(&rmd[..]);
        digest
    }
}

/// Convenience function for hashing a byte slice with double-SHA256.
pub fn hash256(bytes: &[u8]) -> Hash256Digest {
    let mut w = Hash256Writer::default();
    w.write_all(bytes).expect("no IOError from SHA2");
    w.finish()
}

/// Convenience function for hashing a byte slice with SHA256-then-RIPEMD160.
pub fn hash160(bytes: &[u8]) -> Hash160Digest {
    let mut w = Hash160Writer::default();
    w.write_all(bytes).expect("no IOError from SHA2");
    w.finish()
}

/// Convenience function for a single SHA256.
pub fn sha256(bytes: &[u8]) -> Hash256Digest {
    let mut digest = Hash256Digest::default();
    digest[..].copy_from_slice(&Sha256::digest(bytes)[..]);
    digest
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_ignores_flush() {
        let mut w = Hash256Writer::default();
        w.write_all(&[0]).unwrap();
        w.flush().unwrap();
        assert_eq!(
            hex::encode(w.finish()),
            "1406e05881e299367766d313e26c05564ec91bf721d31726bd6e46e60689539a"
        );
    }

    #[test]
    fn it_computes_hash160() {
        // hash160 of the compressed generator-point pubkey
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        assert_eq!(
            hex::encode(hash160(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn it_computes_hash256() {
        assert_eq!(
            hex::encode(hash256(b"hello")),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }
}
