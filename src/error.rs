//! Error types for geodex.

use thiserror::Error;

/// Errors surfaced by the geo manager and store backends.
#[derive(Error, Debug)]
pub enum GeodexError {
    /// Caller-supplied input was rejected before touching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The record addressed by an update does not exist.
    #[error("record {0} not found")]
    NotFound(i64),

    /// A failure reported by the underlying datastore. Never retried here;
    /// propagated verbatim to the caller.
    #[error("datastore error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A transaction handle was used after commit or rollback.
    #[error("transaction already finished")]
    TransactionFinished,
}

impl GeodexError {
    /// Wrap a backend error for propagation.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GeodexError::Store(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, GeodexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer gone");
        let err = GeodexError::store(io);
        assert!(matches!(err, GeodexError::Store(_)));
        assert!(err.to_string().contains("datastore error"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_input_message() {
        let err = GeodexError::InvalidInput("missing corner".into());
        assert_eq!(err.to_string(), "invalid input: missing corner");
    }
}
