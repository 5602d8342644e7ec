//! Persistent (immutable) sequence built on a bit-mapped vector trie.
//!
//! - [`PersistentVector`]: radix-32 trie with an offset/length window
//! - [`PersistentVectorIterator`]: leaf-caching cursor over a borrowed vector
//! - [`PersistentVectorIntoIterator`]: leaf-caching cursor over an owned vector
//! - [`TrieError`]: precondition failures of the checked API
//!
//! # Structural Sharing
//!
//! Every operation returns a new vector. Only the nodes on the path to the
//! affected leaf are copied; every other subtree is shared with the source.
//! Slicing with [`PersistentVector::drop_first`] and [`PersistentVector::take`]
//! releases the subtrees that fall outside the new window.
//!
//! # Examples
//!
//! ```rust
//! use bitmapped_trie::persistent::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..100).collect();
//! assert_eq!(vector.get(50), Some(&50));
//!
//! // Structural sharing: the original vector is preserved
//! let updated = vector.update(50, 999).unwrap();
//! assert_eq!(vector.get(50), Some(&50));     // Original unchanged
//! assert_eq!(updated.get(50), Some(&999));   // New version
//!
//! // Slicing is logarithmic and never copies the visible elements
//! let window = vector.take(40).drop_first(10);
//! assert_eq!(window.len(), 30);
//! assert_eq!(window.get(0), Some(&10));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (the default), this is `std::sync::Arc`,
/// which makes vectors `Send + Sync` for shareable elements.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod error;
mod iterator;
mod node;
mod vector;

pub use error::Result;
pub use error::TrieError;
pub use iterator::PersistentVectorIntoIterator;
pub use iterator::PersistentVectorIterator;
pub use vector::PersistentVector;

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentVector<i32>: Send, Sync);

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentVectorIterator<'static, i32>: Send, Sync);
