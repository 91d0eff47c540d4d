//! Engine-wide parameters

/// Width, in bits, of every symbolic and concrete [`crate::value::Value`] the
/// interpreter manipulates. Whitespace numbers are arbitrary precision at the
/// syntax level but the reference VM folds them into native machine words the
/// moment they participate in arithmetic; we pick 32 bits and stay consistent.
pub const WORD_WIDTH: u32 = 32;

/// Width, in bits, of a byte read from stdin via `ReadChar` before it is
/// zero-extended to [`WORD_WIDTH`].
pub const BYTE_WIDTH: u32 = 8;

/// Default bound on backward-jump iteration counts, matching the reference
/// CLI default.
pub const DEFAULT_LOOP_LIMIT: u64 = 10;

/// RNG seed used by `Strategy::Random` when the CLI isn't given `--seed`,
/// chosen for reproducible exploration runs rather than any numerological
/// significance.
pub const DEFAULT_SEED: u64 = 0x5748_4954_4553_5043; // b"WHITESPC" as bytes, read big-endian
