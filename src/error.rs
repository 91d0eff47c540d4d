//! Error taxonomy.
//!
//! Two tiers, mirroring the split the reference interpreter draws between a
//! recoverable panic (attributable to one state) and a halt (attributable to
//! the engine as a whole): [`RuntimeErrorKind`] terminates the one state that
//! hit it and is recorded on [`crate::state::Status::Errored`]; [`EngineError`]
//! aborts whatever call produced it (parsing, state construction, or
//! concretization) and is never silently folded into a bucket.

use thiserror::Error;

/// A runtime error local to a single [`crate::state::State`]. Hitting one of
/// these terminates that state into the `errored` bucket; it never aborts
/// exploration of the other states in a [`crate::path_group::PathGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuntimeErrorKind {
    /// Popped from an empty stack.
    #[error("stack underflow")]
    StackUnderflow,
    /// `Call`/`Jump`/`JumpZero`/`JumpNegative` referenced an undefined label.
    #[error("jump or call to an undefined label")]
    BadLabel,
    /// `Return` with an empty call stack.
    #[error("return with no caller on the call stack")]
    BadReturn,
    /// `Div`/`Mod` with a divisor that is feasibly zero, taken on the branch
    /// where it actually is zero.
    #[error("division or modulo by zero")]
    DivByZero,
    /// `ReadChar`/`ReadNum` past the end of stdin, or `ReadNum` encountering
    /// a byte it cannot resolve to a concrete digit before its terminating
    /// newline.
    #[error("read past end of stdin")]
    EofStdin,
    /// The parser handed the interpreter an opcode it doesn't recognize.
    /// Should be unreachable since [`crate::parser::parse`] rejects malformed
    /// programs itself.
    #[error("invalid instruction")]
    InvalidInstruction,
}

/// A fatal, engine-level failure: something outside any one state's control
/// went wrong. These propagate as `Result::Err` rather than being folded into
/// a [`crate::path_group::PathGroup`] bucket.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The Whitespace source failed to tokenize or assemble.
    #[error("failed to parse program: {0}")]
    Parse(#[from] crate::parser::ParseError),
    /// The program file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The SMT backend itself failed — as opposed to returning `Unknown`,
    /// which is folded into `Sat` and never surfaces as an error.
    #[error("solver error: {0}")]
    Solver(String),
}
