use thiserror::Error;

use super::NodeId;

/// The result of an AIG operation.
pub type Result<T> = std::result::Result<T, AigError>;

/// Error returned when an AIG operation failed.
#[derive(Debug, Error)]
pub enum AigError {
    /// A different node with the given id already exists.
    #[error("a different node with id={0} already exists")]
    DuplicateId(NodeId),

    /// The id 0 is reserved for the constant node only.
    #[error("id=0 is for the constant node only")]
    IdZeroButNotFalse,

    /// The node with given id does not exist.
    #[error("node with id={0} does not exist")]
    NodeDoesNotExist(NodeId),

    /// The id does not fit in the node arena.
    #[error("id={0} exceeds the maximum id {1}")]
    IdOutOfRange(NodeId, NodeId),

    /// The AIG has reached an invalid state. This should never happen.
    #[error("the AIG has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),

    /// The SAT oracle failed.
    #[error("sat solver failure: {0}")]
    Sat(String),

    /// A long running operation was cancelled through its [`CancelToken`].
    ///
    /// [`CancelToken`]: crate::fraig::CancelToken
    #[error("operation cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Just forwarding a [`ParserError`].
    #[error("{0}")]
    Parser(#[from] ParserError),

    /// Just forwarding a [`PatternError`].
    #[error("{0}")]
    Pattern(#[from] PatternError),
}

/// Error returned when parsing an ASCII AIGER file failed.
///
/// Lines and columns are 1-based.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParserError {
    /// All features are not supported (only the basics in fact).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("[ERROR] Line {line}, Col {col}: Missing {what}!!")]
    MissingToken {
        line: usize,
        col: usize,
        what: &'static str,
    },

    /// Invalid token, something else was expected.
    #[error("[ERROR] Line {line}: Illegal {what} \"{token}\"!!")]
    InvalidToken {
        line: usize,
        what: &'static str,
        token: String,
    },

    #[error("[ERROR] Line {line}, Col {col}: A new line is expected here, got \"{token}\"!!")]
    ExtraToken {
        line: usize,
        col: usize,
        token: String,
    },

    #[error("[ERROR] Line {line}: {what} is too small ({value})!!")]
    NumTooSmall {
        line: usize,
        what: &'static str,
        value: u64,
    },

    #[error("[ERROR] Line {line}: {what} is too big ({value})!!")]
    NumTooBig {
        line: usize,
        what: &'static str,
        value: u64,
    },

    #[error("[ERROR] Line {line}, Col {col}: Literal \"{lit}\" exceeds maximum valid ID!!")]
    MaxLitId { line: usize, col: usize, lit: u64 },

    #[error("[ERROR] Line {line}, Col {col}: {what} {lit}({var}) cannot be inverted!!", var = .lit / 2)]
    CannotInvert {
        line: usize,
        col: usize,
        what: &'static str,
        lit: u64,
    },

    #[error("[ERROR] Line {line}, Col {col}: Cannot redefine const ({lit})!!")]
    RedefConst { line: usize, col: usize, lit: u64 },

    #[error(
        "[ERROR] Line {line}: Literal \"{lit}\" is redefined, previously defined as {kind} in line {previous_line}!!"
    )]
    RedefGate {
        line: usize,
        lit: u64,
        kind: &'static str,
        previous_line: usize,
    },

    #[error("[ERROR] Line {line}: Symbolic name for \"{kind}{index}\" is redefined!!")]
    RedefSymbol {
        line: usize,
        kind: char,
        index: u64,
    },

    #[error("[ERROR] Line {line}, Col 1: Illegal symbol type ({token})!!")]
    IllegalSymbolType { line: usize, token: String },

    #[error("[ERROR] Line {line}: Symbolic name contains un-printable char({code})!!")]
    IllegalSymbolName { line: usize, code: u32 },

    #[error("[ERROR] Line {line}: Missing {what} definition!!")]
    MissingDefinition { line: usize, what: &'static str },

    /// An IO error occured (file doesn't exist, or doesn't have the right extension, ...).
    #[error("io error: {0}")]
    Io(String),
}

/// Why a simulation pattern was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternErrorKind {
    #[error(
        "Pattern({pattern}) length({len}) does not match the number of inputs({expected}) in a circuit!!",
        len = .pattern.chars().count()
    )]
    LengthMismatch { pattern: String, expected: usize },

    #[error("Pattern({pattern}) contains a non-0/1 character('{ch}')")]
    NonBinary { pattern: String, ch: char },
}

/// Error returned when a pattern file is malformed.
///
/// Processing stops at the first bad pattern, `simulated` patterns were
/// simulated before it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{kind} ({simulated} patterns simulated)")]
pub struct PatternError {
    pub simulated: usize,
    pub kind: PatternErrorKind,
}
