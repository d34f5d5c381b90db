//! Error types for the Dockerfile lint engine.
//!
//! Errors come in three tiers: fatal structural errors that abort parsing or
//! model construction (`ParseError`, `ModelError`), instruction-local errors
//! that are recorded on the offending node and never abort the build, and
//! per-check errors that are attributed to a single check ID in the report
//! (`CheckError`).

use thiserror::Error;

/// Fatal errors raised while tokenizing a Dockerfile stream.
///
/// Instruction-level problems (bad argument shapes, unknown keywords) are
/// deliberately *not* represented here; those are recorded on the node and
/// surface through lint checks instead.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying stream could not be read.
    #[error("failed to read Dockerfile: {0}")]
    Io(#[from] std::io::Error),

    /// A physical line exceeded the scan buffer limit.
    #[error("line {line} exceeds the scan buffer limit of {limit} bytes")]
    LineTooLong { line: usize, limit: usize },

    /// More than one `# escape=` directive was found.
    #[error("only one escape directive is allowed, second found on line {line}")]
    DuplicateEscapeDirective { line: usize },

    /// The `# escape=` directive named a character other than backslash or backtick.
    #[error("invalid escape token '{token}', must be \\ or `")]
    InvalidEscapeDirective { token: String },
}

/// Fatal errors raised while building the semantic Dockerfile model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The root AST node was marked invalid; no partial model is produced.
    #[error("invalid Dockerfile")]
    InvalidRoot,
}

/// An error produced (or a panic caught) while running a single check.
///
/// These never abort the engine; they are keyed by check ID in
/// [`Report::errors`](crate::checks::Report).
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("check failed: {0}")]
    Failed(String),

    #[error("check panicked: {0}")]
    Panicked(String),
}
