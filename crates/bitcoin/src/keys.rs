//! ECDSA key wrappers over the k256 secp256k1 implementation.
//!
//! `Privkey` signs 32-byte sighash digests, producing low-S-normalized
//! signatures as consensus requires. `Pubkey` carries the compressed SEC1
//! encoding and the hash160 used by pubkey-hash script templates.

use k256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use txforge_core::hashes::{hash160, Hash160Digest, Hash256Digest};

use crate::error::{TransactionError, TxResult};

/// A secp256k1 private key.
#[derive(Clone, Debug)]
pub struct Privkey(SigningKey);

impl Privkey {
    /// Instantiate a private key from a 32-byte scalar.
    pub fn from_slice(bytes: &[u8]) -> TxResult<Self> {
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| TransactionError::BadKey(e.to_string()))?;
        Ok(Privkey(key))
    }

    /// Instantiate a private key from 32 hex-encoded bytes.
    pub fn from_hex(s: &str) -> TxResult<Self> {
        let bytes = hex::decode(s).map_err(|e| TransactionError::BadKey(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// The public key corresponding to this private key.
    pub fn pubkey(&self) -> Pubkey {
        Pubkey(VerifyingKey::from(&self.0))
    }

    /// Sign a 32-byte digest, normalizing the signature to low-S form.
    pub fn sign_digest(&self, digest: Hash256Digest) -> TxResult<Signature> {
        let sig: Signature = self
            .0
            .sign_prehash(&digest)
            .map_err(|e| TransactionError::BadSignature(e.to_string()))?;
        Ok(sig.normalize_s().unwrap_or(sig))
    }
}

/// A secp256k1 public key, carried in compressed form.
#[derive(Clone, Debug)]
pub struct Pubkey(VerifyingKey);

impl Pubkey {
    /// Instantiate a public key from SEC1 bytes (compressed or
    /// uncompressed).
    pub fn from_slice(bytes: &[u8]) -> TxResult<Self> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| TransactionError::BadKey(e.to_string()))?;
        Ok(Pubkey(key))
    }

    /// Instantiate a public key from hex-encoded SEC1 bytes.
    pub fn from_hex(s: &str) -> TxResult<Self> {
        let bytes = hex::decode(s).map_err(|e| TransactionError::BadKey(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// The 33-byte compressed SEC1 encoding.
    pub fn to_array(&self) -> [u8; 33] {
        let point = self.0.to_encoded_point(true);
        let mut buf = [0u8; 33];
        buf.copy_from_slice(point.as_bytes());
        buf
    }

    /// The compressed encoding as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_array())
    }

    /// The hash160 of the compressed encoding, as committed to by
    /// pubkey-hash script templates.
    pub fn hash160(&self) -> Hash160Digest {
        hash160(&self.to_array())
    }

    /// Verify a signature over a 32-byte digest.
    pub fn verify_digest(&self, digest: Hash256Digest, sig: &Signature) -> bool {
        self.0.verify_prehash(&digest, sig).is_ok()
    }
}

impl PartialEq for Pubkey {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

impl Eq for Pubkey {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_derives_the_generator_pubkey_from_key_one() {
        let privkey = Privkey::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(
            privkey.pubkey().to_hex(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(
            hex::encode(privkey.pubkey().hash160()),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn it_signs_and_verifies_digests() {
        let privkey = Privkey::from_hex(
            "1111111111111111111111111111111111111111111111111111111111111111",
        )
        .unwrap();
        let digest = txforge_core::hashes::hash256(b"sign me");
        let sig = privkey.sign_digest(digest).unwrap();
        assert!(privkey.pubkey().verify_digest(digest, &sig));

        let other = txforge_core::hashes::hash256(b"different digest");
        assert!(!privkey.pubkey().verify_digest(other, &sig));
    }

    #[test]
    fn it_rejects_bad_keys() {
        assert!(Privkey::from_slice(&[0u8; 32]).is_err());
        assert!(Pubkey::from_slice(&[0u8; 33]).is_err());
    }
}
