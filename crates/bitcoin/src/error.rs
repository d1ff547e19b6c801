//! The error type shared by transaction construction, policy validation,
//! signing, and serialization.

use std::io::Error as IOError;

use thiserror::Error;
use txforge_core::{enc::EncodingError, ser::SerError};

/// An error type for transaction objects.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Serialization-related errors
    #[error(transparent)]
    Ser(#[from] SerError),

    /// IOError bubbled up from a `Write` passed to a `ByteFormat::write_to`
    /// implementation.
    #[error(transparent)]
    Io(#[from] IOError),

    /// Address encoding/decoding errors
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A caller-supplied argument was unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An input lacked previous-output information that the operation needs.
    #[error("Need more info: {0}")]
    NeedMoreInfo(String),

    /// A multisig threshold exceeded the number of public keys.
    #[error("Invalid threshold: {threshold} of {keys} keys")]
    InvalidThreshold {
        /// The requested signature threshold.
        threshold: usize,
        /// The number of public keys provided.
        keys: usize,
    },

    /// The previous output's locking script is not a recognized spendable
    /// shape.
    #[error("Unsupported script type: {0}")]
    UnsupportedScriptType(String),

    /// An output amount was not a positive integer within protocol bounds.
    #[error("Invalid amount: {0}")]
    InvalidAmount(u64),

    /// An output amount is not representable without corruption.
    #[error("Invalid satoshis: {0}")]
    InvalidSatoshis(u64),

    /// The sum of output amounts exceeds the sum of input amounts.
    #[error("Output amount sum {outputs} exceeds input amount {inputs}")]
    InvalidOutputAmountSum {
        /// Total of all input amounts.
        inputs: u64,
        /// Total of all output amounts.
        outputs: u64,
    },

    /// An input was constructed without previous-output information, so its
    /// amount is unknown.
    #[error("No previous output information for input")]
    MissingPreviousOutputInfo,

    /// The implied fee is large and no change address was provided to
    /// receive the difference.
    #[error("Fee is too large and no change address was provided")]
    ChangeAddressMissing,

    /// The implied fee exceeds the estimated fee by more than the security
    /// margin.
    #[error("Fee too large: expected less than {max} but got {got}")]
    FeeTooLarge {
        /// The largest acceptable fee.
        max: u64,
        /// The implied fee.
        got: u64,
    },

    /// The implied fee is below the estimated fee by more than the security
    /// margin.
    #[error("Fee too small: expected more than {min} but got {got}")]
    FeeTooSmall {
        /// The smallest acceptable fee.
        min: u64,
        /// The implied fee.
        got: u64,
    },

    /// The unspent value differs from the explicitly declared fee.
    #[error("Unspent value is {unspent} but specified fee is {declared}")]
    FeeDifferentThanDeclared {
        /// The fee set via `fee()`.
        declared: u64,
        /// The actual difference between inputs and outputs.
        unspent: u64,
    },

    /// An output below the dust threshold with a spendable script.
    #[error("Dust amount detected in one output")]
    DustOutputs,

    /// Some input is not fully signed.
    #[error("Some inputs have not been fully signed")]
    MissingSignatures,

    /// The serialized transaction exceeds the maximum size.
    #[error("Transaction of size {0} exceeds maximum block size")]
    ExceedsMaxBlockSize(usize),

    /// A negative value was passed to `lock_until_block_height`.
    #[error("Locktime can't be negative: {0}")]
    NegativeLockTime(i64),

    /// A block height at or above the locktime type threshold.
    #[error("Block height {0} is too high to be used as a locktime")]
    BlockHeightTooHigh(i64),

    /// A timestamp below the locktime type threshold, which would be read
    /// as a block height.
    #[error("Locktime {0} is too early to be used as a date")]
    LockTimeTooEarly(i64),

    /// An index was out of range for the input or output vector.
    #[error("Invalid index: {index} (length {length})")]
    InvalidIndex {
        /// The offending index.
        index: usize,
        /// The length of the vector indexed into.
        length: usize,
    },

    /// A caller-supplied output ordering was not a permutation of the
    /// current outputs.
    #[error("Invalid sorting: not a permutation of the current outputs")]
    InvalidSorting,

    /// An object's embedded hash does not match the reconstructed
    /// transaction.
    #[error("Hash in object does not match transaction hash")]
    HashMismatch,

    /// The input's script kind is unknown, so signatures cannot be checked.
    #[error(
        "Unrecognized script kind, or not enough information to execute script. \
         This usually happens when creating a transaction from a serialized transaction"
    )]
    UnableToVerifySignature,

    /// Caller provided an unknown sighash flag to `Sighash::from_u8`.
    #[error("Unknown Sighash: {0}")]
    UnknownSighash(u8),

    /// Sighash NONE is unsupported.
    #[error("SIGHASH_NONE is unsupported")]
    NoneUnsupported,

    /// Satoshi's sighash single bug. Throws an error here.
    #[error("SIGHASH_SINGLE bug is unsupported")]
    SighashSingleBug,

    /// Got an unknown flag where we expected a witness flag. May indicate a
    /// non-witness transaction.
    #[error("Witness flag not as expected. Got {:?}. Expected {:?}.", .0, [0u8, 1u8])]
    BadWitnessFlag([u8; 2]),

    /// A key could not be parsed or used.
    #[error("Bad key: {0}")]
    BadKey(String),

    /// A signature could not be parsed, produced, or applied.
    #[error("Bad signature: {0}")]
    BadSignature(String),

    /// JSON (de)serialization of the object form failed.
    #[error("Object form error: {0}")]
    ObjectError(#[from] serde_json::Error),
}

/// Type alias for result with TransactionError
pub type TxResult<T> = Result<T, TransactionError>;
