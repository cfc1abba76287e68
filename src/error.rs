use std::fmt;

/// Error surface for every public codec operation.
///
/// Mirrors the donor's flat, hand-rolled `LibdeflateError`: a plain enum with
/// no derive-macro crate behind it, but implementing `Display`/`Error` so it
/// composes with `?` the way a published library's error type should.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The operation is incompatible with the codec's current lifecycle state,
    /// e.g. `add` after `build`, `build` on an empty codec, `encode` before `build`.
    StateViolation {
        expected: &'static str,
        actual: &'static str,
    },

    /// `encode` found a byte with no assigned code and no escape code to fall back to.
    UnknownSymbol(u8),

    /// Table allocation for a new codec could not be satisfied.
    AllocationFailure,

    /// `deserialize` saw a blob that is truncated or internally inconsistent
    /// (a code length above `MAX_CODE_LEN`, or not enough bytes for the
    /// declared per-symbol entries).
    CorruptBlob(&'static str),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::StateViolation { expected, actual } => write!(
                f,
                "codec state violation: expected {expected}, found {actual}"
            ),
            CodecError::UnknownSymbol(byte) => {
                write!(f, "encode: byte {byte:#04x} has no code and no escape")
            }
            CodecError::AllocationFailure => write!(f, "failed to allocate codec tables"),
            CodecError::CorruptBlob(reason) => write!(f, "corrupt codec blob: {reason}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Return early with a `StateViolation` unless `cond` holds.
///
/// Plays the same role as the donor's `safety_check!`, which returns
/// `LibdeflateError::BadData` on failed invariants.
macro_rules! require_state {
    ($cond:expr, $expected:expr, $actual:expr) => {
        if !($cond) {
            return Err($crate::error::CodecError::StateViolation {
                expected: $expected,
                actual: $actual,
            });
        }
    };
}

pub(crate) use require_state;
