//! Error types for Tributary collections.

use thiserror::Error;

/// Result type alias for Tributary operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised at the call site of a collection operation.
///
/// None of these is ever delivered through a change feed. A call that
/// fails leaves the collection exactly as it was and publishes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A required collaborator was not supplied.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
    /// An index or range lies outside the current bounds.
    #[error("Index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// The operation is structurally illegal for this kind of collection.
    #[error("Unsupported operation: {operation} on {kind}")]
    UnsupportedOperation {
        operation: &'static str,
        kind: &'static str,
    },
}

impl Error {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Error::IndexOutOfRange { index, len }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str, kind: &'static str) -> Self {
        Error::UnsupportedOperation { operation, kind }
    }
}

/// Checks that `index` addresses an existing element.
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::index_out_of_range(index, len))
    }
}

/// Checks that `index..index + count` lies within `0..=len`.
pub(crate) fn check_range(index: usize, count: usize, len: usize) -> Result<()> {
    match index.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        Some(end) => Err(Error::index_out_of_range(end, len)),
        None => Err(Error::index_out_of_range(usize::MAX, len)),
    }
}
