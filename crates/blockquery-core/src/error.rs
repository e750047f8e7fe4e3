//! Error types for the block query pipeline.

use thiserror::Error;

/// Errors that can occur while resolving a block query.
///
/// Every variant is terminal for the request it occurred in; nothing is
/// retried inside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The caller supplied an invalid, ambiguous or oversized selector.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// An upstream reference (hash, tag, range endpoint) did not resolve to a block.
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// A pagination cursor could not be encoded or decoded.
    #[error("Cursor error: {0}")]
    Codec(String),

    /// The upstream data source failed (transport, malformed response, ...).
    #[error("Data source error: {0}")]
    Source(String),
}

impl QueryError {
    /// Shorthand for [`QueryError::Argument`].
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    /// Shorthand for [`QueryError::Resolution`].
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Shorthand for [`QueryError::Codec`].
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Returns `true` if the error was caused by what the caller sent
    /// (bad arguments or a malformed cursor) rather than by upstream state.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Argument(_) | Self::Codec(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors() {
        assert!(QueryError::argument("x").is_caller_error());
        assert!(QueryError::codec("x").is_caller_error());
        assert!(!QueryError::resolution("x").is_caller_error());
        assert!(!QueryError::Source("x".into()).is_caller_error());
    }

    #[test]
    fn argument_message_is_verbatim() {
        let e = QueryError::argument("start must precede end");
        assert_eq!(e.to_string(), "Invalid argument: start must precede end");
    }
}
