//! This module holds `MarkedDigest` types used by Bitcoin transactions.
//! Currently we represent only `TXID`s and `WTXID`s.

use txforge_core::mark_hash256;

mark_hash256!(
    /// A marked Hash256Digest representing transaction IDs
    TXID
);
mark_hash256!(
    /// A marked Hash256Digest representing witness transaction IDs
    WTXID
);
