//! Error types surfaced by the text CRDT engine.

use thiserror::Error;

/// Errors returned by text CRDT operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    /// A visible range or offset the caller supplied does not address the
    /// current document: reversed bounds, an index past the visible length,
    /// or an offset that does not land on a character boundary.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// A structural invariant of the node graph is broken. The engine does
    /// not attempt self-repair; the current edit is abandoned.
    #[error("corrupt state: {0}")]
    CorruptState(String),
}

impl TextError {
    pub(crate) fn invalid_position(msg: impl Into<String>) -> Self {
        TextError::InvalidPosition(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        TextError::CorruptState(msg.into())
    }
}
