//! Errors returned at the public call boundary.

use thiserror::Error;

/// A precondition of a tree or cursor operation did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Positional access past the end of the tree
    #[error("index {index} out of bounds for tree of {count} values")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// Number of values in the tree
        count: usize,
    },

    /// The cursor is not positioned on a value
    #[error("cursor is off")]
    CursorOff,

    /// No value in the tree is deep-equal to the one asked for
    #[error("value not found")]
    ValueNotFound,

    /// The tree holds no value
    #[error("tree is empty")]
    Empty,

    /// The tree this cursor was made from has been dropped
    #[error("cursor outlived its tree")]
    TreeDisposed,
}

impl Error {
    /// Create an index out of bounds error
    pub fn out_of_bounds(index: usize, count: usize) -> Self {
        Self::IndexOutOfBounds { index, count }
    }
}

/// Result type of every fallible tree operation
pub type Result<T> = std::result::Result<T, Error>;
