//! Error type shared by the storage layer.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the adjacency store and its codecs.
///
/// Expected absences (deleting an edge that is not there, setting a property
/// on a missing vertex) are reported as `Ok(false)` / `Ok(None)` by the
/// operations themselves, not as errors. `Corruption` signals a broken
/// storage invariant or a caller bypassing the single-writer contract; it is
/// not recoverable and must not be caught and retried.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Storage invariant violated: reciprocal edge missing, record kind
    /// mismatch at an expected key, malformed size indicator.
    #[error("corruption detected: {0}")]
    Corruption(String),
    /// An identifier or property exceeded a configured maximum.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),
    /// A required entity (for example an edge endpoint) does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Caller supplied an argument outside the contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A mutating operation was invoked on a read-only transaction.
    #[error("write attempted on read-only transaction")]
    ReadOnlyTxn,
}
