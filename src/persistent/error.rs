//! Error types for the persistent vector trie.
//!
//! Only caller-visible precondition failures live here. A broken structural
//! invariant is a bug in this crate and panics instead.

use thiserror::Error;

/// Result type alias using [`TrieError`].
pub type Result<T> = std::result::Result<T, TrieError>;

/// Errors returned by fallible [`PersistentVector`](super::PersistentVector) operations.
///
/// # Examples
///
/// ```rust
/// use bitmapped_trie::persistent::{PersistentVector, TrieError};
///
/// let vector: PersistentVector<i32> = (0..3).collect();
/// let error = vector.update(3, 0).unwrap_err();
/// assert_eq!(error, TrieError::IndexOutOfBounds { index: 3, length: 3 });
/// assert_eq!(
///     error.to_string(),
///     "index 3 is out of bounds for a vector of length 3"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// The index does not address a visible element.
    #[error("index {index} is out of bounds for a vector of length {length}")]
    IndexOutOfBounds {
        /// The rejected index.
        index: usize,
        /// The length of the vector at the time of the call.
        length: usize,
    },
}
