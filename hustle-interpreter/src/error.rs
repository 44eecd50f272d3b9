use hustle_gc::GcError;
use thiserror::Error;

/// Failures a well-behaved embedder is expected to catch.
///
/// Broken heap or object layout invariants are not represented here: they panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack index {index} out of range (depth {depth})")]
    StackIndexOutOfRange { index: usize, depth: usize },

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("cannot call a {0}")]
    NotCallable(&'static str),

    #[error("expected a {expected}, found a {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid length: {0}")]
    InvalidLength(isize),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("halt requested")]
    Halt,

    #[error(transparent)]
    Gc(#[from] GcError),
}
