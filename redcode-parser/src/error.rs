//! The single error type returned by every stage of compilation.

use thiserror::Error;

/// A compilation failure, tagged with the 1-based source line it was
/// detected on.
///
/// Per the error-handling policy: compilation either succeeds with a
/// complete `WarriorData` or fails with exactly one of these. There is no
/// partial result and no multi-error accumulation — the first problem found
/// stops the pipeline.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct CompileError {
    /// 1-based line number the failure was detected on. `0` when the failure
    /// has no single originating line (e.g. a `for` nesting bound exceeded
    /// across the whole source).
    pub line: usize,
    /// Human-readable description of the failure.
    pub message: String,
}

impl CompileError {
    /// Build a new error tagged with `line`.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}
