//! Protocol and policy constants, and the per-call options for checked
//! serialization.
//!
//! Every constant here is a plain `pub const`. Policy relaxation is done by
//! passing a `SerializeOpts` into `Transaction::checked_serialize`, never
//! through mutable global state, so that any deviation from default policy
//! is visible at the call site.

/// Minimum amount for an output for it not to be considered dust.
pub const DUST_AMOUNT: u64 = 546;

/// Margin of error to allow fees in the vicinity of the expected value, but
/// not a big difference.
pub const FEE_SECURITY_MARGIN: u64 = 150;

/// Max amount of satoshis in circulation.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Largest amount representable exactly as a JSON/double number (2^53 - 1).
/// Amounts above this cannot survive the object round-trip and are treated
/// as corrupted.
pub const MAX_SAFE_SATOSHIS: u64 = 0x1f_ffff_ffff_ffff;

/// nLockTime limit to be considered a block height rather than a timestamp.
pub const NLOCKTIME_BLOCKHEIGHT_LIMIT: u32 = 500_000_000;

/// Max value for an unsigned 32 bit field.
pub const NLOCKTIME_MAX_VALUE: u32 = 0xffff_ffff;

/// Value used for fee estimation (satoshis per kilobyte).
pub const FEE_PER_KB: u64 = 100_000;

/// Maximum size of a serialized transaction, in bytes.
pub const MAX_TX_SIZE: usize = 1_000_000;

/// The default transaction version number for newly built transactions.
pub const CURRENT_VERSION: i32 = 2;

/// The maximal sequence number. Inputs at this value opt out of locktime
/// enforcement and RBF.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// The sequence number newly added inputs carry.
pub const DEFAULT_SEQUENCE: u32 = SEQUENCE_FINAL;

/// The sequence number assigned to inputs when a locktime is set, so that
/// the locktime is enforced at the protocol level.
pub const DEFAULT_LOCKTIME_SEQUENCE: u32 = SEQUENCE_FINAL - 1;

/// The BIP125 replace-by-fee opt-in sequence number.
pub const DEFAULT_RBF_SEQUENCE: u32 = SEQUENCE_FINAL - 2;

/// Relative-locktime sequence flag selecting time-based (rather than
/// height-based) locks.
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;

/// Relative-locktime sequence flag disabling relative locks entirely.
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;

/// Mask for the 16 bits of a sequence number that carry the relative lock
/// value.
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0xffff;

/// Granularity of time-based relative locks, in seconds.
pub const SEQUENCE_LOCKTIME_GRANULARITY: u32 = 512;

/// Safe upper bound for change address script size in bytes.
pub const CHANGE_OUTPUT_MAX_SIZE: usize = 20 + 4 + 34 + 4;

/// Safe upper bound for the fixed serialization overhead of a transaction.
pub const MAXIMUM_EXTRA_SIZE: usize = 4 + 9 + 9 + 4;

/// Options for `Transaction::checked_serialize`. Each flag skips exactly one
/// rung of the validation ladder. The default runs every check.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SerializeOpts {
    /// Disable all checks, equivalent to unchecked serialization.
    pub disable_all: bool,
    /// Skip the fee-too-small check.
    pub disable_small_fees: bool,
    /// Skip the fee-too-large check.
    pub disable_large_fees: bool,
    /// Skip checking that all inputs are fully signed.
    pub disable_is_fully_signed: bool,
    /// Skip checking for dust outputs.
    pub disable_dust_outputs: bool,
    /// Skip checking that outputs do not spend more than the inputs provide.
    pub disable_more_output_than_input: bool,
}

impl SerializeOpts {
    /// Options that skip every check.
    pub fn unchecked() -> Self {
        SerializeOpts {
            disable_all: true,
            ..Default::default()
        }
    }
}
