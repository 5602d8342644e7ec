//! # bitmapped-trie
//!
//! A persistent (immutable) sequence backed by a bit-mapped vector trie with
//! branching factor 32.
//!
//! ## Overview
//!
//! [`persistent::PersistentVector`] keeps its elements in a radix-32 trie and
//! exposes a window `[offset, offset + length)` of the trie's address space.
//! Every operation returns a new vector that shares all untouched subtrees
//! with its source:
//!
//! - **Random access**: `get` and `update` in O(log32 N)
//! - **Both ends**: amortized O(1) `append` and `prepend`
//! - **Slicing**: `drop_first`, `take` and `slice` in O(log32 N), releasing
//!   subtrees outside the new window
//! - **Bulk transforms**: `map` and `filter` in O(N) over whole leaves
//!
//! ## Feature Flags
//!
//! - `arc` (default): share nodes through `Arc`, making vectors `Send + Sync`.
//!   Without it nodes are shared through `Rc`.
//! - `serde`: `Serialize` / `Deserialize` as a plain sequence
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use bitmapped_trie::prelude::*;
//!
//! let vector: PersistentVector<i32> = (0..1000).collect();
//! let middle = vector.drop_first(100).take(800);
//!
//! assert_eq!(middle.len(), 800);
//! assert_eq!(middle.get(0), Some(&100));
//! assert_eq!(vector.len(), 1000);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use bitmapped_trie::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
