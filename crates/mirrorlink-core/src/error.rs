//! Error types for the core crate.

use thiserror::Error;

/// Failures reading or writing the persisted room identifier.
///
/// These never escape the session: it logs them and carries on as if no room
/// were stored.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A value was found but is not a valid room identifier.
    #[error("stored room identifier is invalid")]
    InvalidRoom,
}
