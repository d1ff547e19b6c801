//! Re-exports of common traits.
pub use crate::{
    hashes::{Hash160Digest, Hash256Digest, MarkedDigest, MarkedDigestWriter},
    ser::ByteFormat,
};
