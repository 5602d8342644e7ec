//! Persistent (immutable) vector based on a bit-mapped vector trie.
//!
//! This module provides [`PersistentVector`], an immutable sequence that uses
//! structural sharing for efficient operations.
//!
//! # Overview
//!
//! `PersistentVector` is a 32-way branching trie whose visible contents are a
//! window `[offset, offset + length)` of the trie's address space. Moving the
//! window instead of rebuilding the tree gives:
//!
//! - O(log32 N) random access (effectively O(1) for practical sizes)
//! - amortized O(1) `append` and `prepend`
//! - O(log32 N) `update`
//! - O(log32 N) `drop_first`, `take` and `slice`
//! - O(1) `len`, `is_empty` and `clone`
//!
//! # Internal Structure
//!
//! The vector consists of:
//! - A root node, which is a leaf when `depth_shift == 0`
//! - `offset`: absolute index of the first visible element
//! - `length`: number of visible elements
//! - `depth_shift`: height of the trie in multiples of 5 bits
//!
//! The trie grows a level on the right when the window reaches the end of the
//! address space, and on the left (placing the old root as the last child)
//! when the window starts at zero. Slicing copies the boundary path, releases
//! the children outside the window, and collapses top levels that hold a
//! single populated child.
//!
//! # Examples
//!
//! ```rust
//! use bitmapped_trie::persistent::PersistentVector;
//!
//! let vector = PersistentVector::new()
//!     .append(2)
//!     .append(3)
//!     .prepend(1);
//!
//! assert_eq!(vector.get(0), Some(&1));
//! assert_eq!(vector.get(1), Some(&2));
//! assert_eq!(vector.get(2), Some(&3));
//!
//! // Structural sharing: the original vector is preserved
//! let extended = vector.append(4);
//! assert_eq!(vector.len(), 3);     // Original unchanged
//! assert_eq!(extended.len(), 4);   // New vector
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Index, Range};

use arrayvec::ArrayVec;
use tracing::trace;

use super::ReferenceCounter;
use super::error::{Result, TrieError};
use super::iterator::{PersistentVectorIntoIterator, PersistentVectorIterator};
use super::node::{
    self, BITS_PER_LEVEL, BRANCHING_FACTOR, LeafStrategy, Node, NodeStrategy, first_digit,
    last_digit, tree_size,
};

// =============================================================================
// PersistentVector Definition
// =============================================================================

/// A persistent (immutable) vector based on a bit-mapped vector trie.
///
/// `PersistentVector` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns.
///
/// # Time Complexity
///
/// | Operation       | Complexity                      |
/// |-----------------|---------------------------------|
/// | `new`           | O(1)                            |
/// | `get`           | O(log32 N)                      |
/// | `update`        | O(log32 N)                      |
/// | `append`        | O(log32 N), amortized O(1)      |
/// | `prepend`       | O(log32 N), amortized O(1)      |
/// | `drop_first`    | O(log32 N)                      |
/// | `take`          | O(log32 N)                      |
/// | `map`, `filter` | O(N)                            |
/// | `len`           | O(1)                            |
/// | `iter`          | O(1) to create, O(N) to iterate |
///
/// # Examples
///
/// ```rust
/// use bitmapped_trie::persistent::PersistentVector;
///
/// let vector: PersistentVector<i32> = (0..100).collect();
/// assert_eq!(vector.len(), 100);
/// assert_eq!(vector.get(50), Some(&50));
/// ```
pub struct PersistentVector<T> {
    /// Root node of the trie (a leaf when `depth_shift == 0`)
    root: ReferenceCounter<Node<T>>,
    /// Absolute index of the first visible element
    offset: usize,
    /// Number of visible elements
    length: usize,
    /// Height of the trie: (levels - 1) * `BITS_PER_LEVEL`
    depth_shift: usize,
}

impl<T> PersistentVector<T> {
    /// Creates a new empty vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = PersistentVector::new();
    /// assert!(vector.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::Leaf(node::Leaf::empty())),
            offset: 0,
            length: 0,
            depth_shift: 0,
        }
    }

    /// Creates a new empty vector. Equivalent to [`PersistentVector::new`].
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::new()
    }

    /// Creates a vector containing a single element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::singleton(42);
    /// assert_eq!(vector.len(), 1);
    /// assert_eq!(vector.get(0), Some(&42));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::from_vec(vec![element])
    }

    /// Creates a vector that takes ownership of `elements`, packing them into
    /// a minimal-height trie.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::from_vec(vec!["a", "b", "c"]);
    /// assert_eq!(vector.len(), 3);
    /// assert_eq!(vector.depth(), 1);
    /// ```
    #[must_use]
    pub fn from_vec(elements: Vec<T>) -> Self {
        if elements.is_empty() {
            return Self::new();
        }
        let length = elements.len();
        let (root, depth_shift) = node::grouped(elements);
        Self {
            root,
            offset: 0,
            length,
            depth_shift,
        }
    }

    /// Returns the number of elements in the vector.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of levels in the underlying trie.
    ///
    /// A vector whose root is a single leaf has depth 1.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let small: PersistentVector<i32> = (0..32).collect();
    /// assert_eq!(small.depth(), 1);
    ///
    /// let larger = small.append(32);
    /// assert_eq!(larger.depth(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth_shift / BITS_PER_LEVEL + 1
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// assert_eq!(vector.get(0), Some(&1));
    /// assert_eq!(vector.get(4), Some(&5));
    /// assert_eq!(vector.get(10), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.length {
            return None;
        }
        let absolute = self.offset + index;
        node::leaf_at(&self.root, self.depth_shift, absolute)?
            .get(last_digit(absolute))
    }

    /// Returns a reference to the first element, or `None` if the vector is empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the last element, or `None` if the vector is empty.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.length.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Returns an iterator over references to the elements.
    ///
    /// The iterator caches the current leaf and descends from the root only
    /// once per leaf, so a full traversal is O(N).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let collected: Vec<&i32> = vector.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3, &4, &5]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentVectorIterator<'_, T> {
        PersistentVectorIterator::new(self, 0)
    }

    /// Returns an iterator starting at logical index `start`.
    ///
    /// A `start` past the end yields an empty iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..100).collect();
    /// let tail: Vec<i32> = vector.iter_from(97).copied().collect();
    /// assert_eq!(tail, vec![97, 98, 99]);
    /// ```
    #[must_use]
    pub fn iter_from(&self, start: usize) -> PersistentVectorIterator<'_, T> {
        PersistentVectorIterator::new(self, start)
    }

    /// Finds the index of the first element that satisfies the predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// assert_eq!(vector.find_index(|x| *x > 3), Some(3));
    /// ```
    #[must_use]
    pub fn find_index<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().position(predicate)
    }

    /// Walks the leaves covering the visible window in order.
    ///
    /// `visitor` receives the running index it returned for the previous leaf
    /// (starting at zero) and the visible elements of the current leaf, and
    /// returns the next running index. The final running index is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..100).collect();
    /// let mut leaves = 0;
    /// let visited = vector.visit(|running, elements| {
    ///     leaves += 1;
    ///     running + elements.len()
    /// });
    /// assert_eq!(visited, 100);
    /// assert_eq!(leaves, 4);
    /// ```
    pub fn visit<F>(&self, mut visitor: F) -> usize
    where
        F: FnMut(usize, &[T]) -> usize,
    {
        let mut running = 0;
        let mut index = 0;
        while index < self.length {
            let elements = self.leaf_run(index);
            running = visitor(running, elements);
            index += elements.len();
        }
        running
    }

    /// Returns a new vector with `function` applied to every element.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=3).collect();
    /// let labels = vector.map(|x| format!("#{x}"));
    /// assert_eq!(labels.get(2).map(String::as_str), Some("#3"));
    /// ```
    #[must_use]
    pub fn map<U, F>(&self, mut function: F) -> PersistentVector<U>
    where
        F: FnMut(&T) -> U,
    {
        let mut results = Vec::with_capacity(self.length);
        self.visit(|running, elements| {
            results.extend(elements.iter().map(&mut function));
            running + elements.len()
        });
        PersistentVector::from_vec(results)
    }

    /// Visible elements of the leaf owning logical `index`, starting at `index`.
    pub(crate) fn leaf_run(&self, index: usize) -> &[T] {
        let (owner, window) = self.leaf_window(index);
        match owner.as_leaf() {
            Some(leaf) => &leaf.elements()[window],
            None => unreachable!("leaf_window always resolves a leaf"),
        }
    }

    /// Resolves the leaf owning logical `index` with one descent.
    ///
    /// Returns the leaf node and the positions inside its element buffer that
    /// are visible from `index` up to the end of the leaf or of the window.
    ///
    /// # Panics
    ///
    /// Panics if the trie does not hold a leaf covering `index`, which means
    /// a structural invariant has been broken.
    pub(crate) fn leaf_window(&self, index: usize) -> (&ReferenceCounter<Node<T>>, Range<usize>) {
        let absolute = self.offset + index;
        let Some((owner, leaf)) = node::leaf_node_at(&self.root, self.depth_shift, absolute)
            .and_then(|owner| owner.as_leaf().map(|leaf| (owner, leaf)))
        else {
            panic!("no leaf owns visible index {index} (absolute {absolute})");
        };
        let from = last_digit(absolute);
        let to = leaf.end().min(from + (self.length - index));
        assert!(
            leaf.start() <= from && from < to,
            "leaf run {}..{} does not cover visible slot {from}",
            leaf.start(),
            leaf.end()
        );
        (owner, from - leaf.start()..to - leaf.start())
    }

    /// Returns `true` if no further element fits to the right of the window.
    #[inline]
    const fn is_full_right(&self) -> bool {
        first_digit(self.offset + self.length, self.depth_shift) >= BRANCHING_FACTOR
    }

    /// Returns `true` if no further element fits to the left of the window.
    #[inline]
    const fn is_full_left(&self) -> bool {
        self.offset == 0
    }

    /// Returns `true` if logical indices `first` and `second` share a leaf.
    #[inline]
    const fn are_pointing_to_same_leaf(&self, first: usize, second: usize) -> bool {
        first_digit(self.offset + first, BITS_PER_LEVEL)
            == first_digit(self.offset + second, BITS_PER_LEVEL)
    }

    /// Builds a vector, peeling top levels while the window lies entirely in
    /// the last child of the root.
    fn collapsed(
        mut root: ReferenceCounter<Node<T>>,
        mut offset: usize,
        length: usize,
        mut depth_shift: usize,
    ) -> Self {
        while depth_shift > 0 {
            let Some(children) = root.as_branch() else {
                break;
            };
            let skipped = children.len() - 1;
            if skipped != node::digit(offset, depth_shift) {
                break;
            }
            let Some(only_child) = children[skipped].clone() else {
                panic!("collapse found an absent child owning the visible window");
            };
            offset -= tree_size(skipped, depth_shift);
            root = only_child;
            depth_shift -= BITS_PER_LEVEL;
            trace!(depth_shift, offset, length, "collapsed top level");
        }
        Self {
            root,
            offset,
            length,
            depth_shift,
        }
    }
}

impl<T: Clone> PersistentVector<T> {
    /// Creates a `PersistentVector` from a slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::from_slice(&[1, 2, 3, 4, 5]);
    /// assert_eq!(vector.len(), 5);
    /// assert_eq!(vector.get(0), Some(&1));
    /// ```
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        Self::from_vec(slice.to_vec())
    }

    /// Updates the element at the given index.
    ///
    /// Only the nodes on the path to the element are copied.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::IndexOutOfBounds`] if `index >= self.len()`.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let updated = vector.update(2, 100).unwrap();
    ///
    /// assert_eq!(updated.get(2), Some(&100));
    /// assert_eq!(vector.get(2), Some(&3)); // Original unchanged
    /// assert!(vector.update(5, 0).is_err());
    /// ```
    pub fn update(&self, index: usize, element: T) -> Result<Self> {
        if index >= self.length {
            return Err(TrieError::IndexOutOfBounds {
                index,
                length: self.length,
            });
        }
        let root = node::modify(
            &self.root,
            self.depth_shift,
            self.offset + index,
            NodeStrategy::CopyNode,
            LeafStrategy::Update(element),
        );
        Ok(Self {
            root,
            offset: self.offset,
            length: self.length,
            depth_shift: self.depth_shift,
        })
    }

    /// Appends an element to the back of the vector.
    ///
    /// # Complexity
    ///
    /// O(log32 N), amortized O(1)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::new().append(1).append(2).append(3);
    ///
    /// assert_eq!(vector.len(), 3);
    /// assert_eq!(vector.get(2), Some(&3));
    /// ```
    #[must_use]
    pub fn append(&self, element: T) -> Self {
        self.append_all(std::iter::once(element))
    }

    /// Appends every element of `elements` to the back of the vector, in order.
    ///
    /// Each round fills the free slots of the rightmost leaf at once, so the
    /// cost per element is amortized O(1).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=3).collect();
    /// let extended = vector.append_all(4..=6);
    ///
    /// let collected: Vec<i32> = extended.iter().copied().collect();
    /// assert_eq!(collected, vec![1, 2, 3, 4, 5, 6]);
    /// ```
    #[must_use]
    pub fn append_all<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut pending = elements.into_iter().peekable();
        let mut result = self.clone();

        while pending.peek().is_some() {
            let mut root = result.root.clone();
            let mut depth_shift = result.depth_shift;
            if result.is_full_right() {
                root = node::grow_right(root);
                depth_shift += BITS_PER_LEVEL;
                trace!(
                    depth_shift,
                    length = result.length,
                    "trie grew on the right"
                );
            }

            let index = result.offset + result.length;
            let leaf_space = BRANCHING_FACTOR - last_digit(index);
            let chunk: ArrayVec<T, BRANCHING_FACTOR> = pending.by_ref().take(leaf_space).collect();
            let delta = chunk.len();

            root = node::modify(
                &root,
                depth_shift,
                index,
                NodeStrategy::CopyNode,
                LeafStrategy::Append(chunk),
            );
            result = Self {
                root,
                offset: result.offset,
                length: result.length + delta,
                depth_shift,
            };
        }
        result
    }

    /// Prepends an element to the front of the vector.
    ///
    /// # Complexity
    ///
    /// O(log32 N), amortized O(1)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=3).collect();
    /// let with_zero = vector.prepend(0);
    ///
    /// assert_eq!(with_zero.get(0), Some(&0));
    /// assert_eq!(with_zero.get(1), Some(&1));
    /// ```
    #[must_use]
    pub fn prepend(&self, element: T) -> Self {
        self.prepend_chunked(vec![element])
    }

    /// Prepends every element of `elements` to the front of the vector.
    ///
    /// The input order is preserved: the first element of `elements` becomes
    /// the first element of the result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (4..=6).collect();
    /// let extended = vector.prepend_all(1..=3);
    ///
    /// let collected: Vec<i32> = extended.iter().copied().collect();
    /// assert_eq!(collected, vec![1, 2, 3, 4, 5, 6]);
    /// ```
    #[must_use]
    pub fn prepend_all<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        self.prepend_chunked(elements.into_iter().collect())
    }

    /// Fills leaves right to left from the end of `pending`.
    fn prepend_chunked(&self, mut pending: Vec<T>) -> Self {
        let mut result = self.clone();

        while !pending.is_empty() {
            let mut root = result.root.clone();
            let mut depth_shift = result.depth_shift;
            let mut offset = result.offset;
            if result.is_full_left() {
                root = node::grow_left(root);
                depth_shift += BITS_PER_LEVEL;
                offset = tree_size(BRANCHING_FACTOR - 1, depth_shift);
                trace!(
                    depth_shift,
                    offset,
                    length = result.length,
                    "trie grew on the left"
                );
            }

            let index = offset - 1;
            let delta = pending.len().min(last_digit(index) + 1);
            let chunk: ArrayVec<T, BRANCHING_FACTOR> =
                pending.drain(pending.len() - delta..).collect();

            root = node::modify(
                &root,
                depth_shift,
                index,
                NodeStrategy::CopyNode,
                LeafStrategy::Prepend(chunk),
            );
            result = Self {
                root,
                offset: offset - delta,
                length: result.length + delta,
                depth_shift,
            };
        }
        result
    }

    /// Returns a new vector with the first `count` elements removed.
    ///
    /// If `count` exceeds the vector's length, returns an empty vector.
    /// Children that fall entirely before the new window are released.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let dropped = vector.drop_first(2);
    /// assert_eq!(dropped.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
    ///
    /// assert!(vector.drop_first(10).is_empty());
    /// assert_eq!(vector.drop_first(0), vector);
    /// ```
    #[must_use]
    pub fn drop_first(&self, count: usize) -> Self {
        if count == 0 {
            return self.clone();
        }
        if count >= self.length {
            return Self::new();
        }

        let index = self.offset + count;
        let root = if self.are_pointing_to_same_leaf(0, count) {
            self.root.clone()
        } else {
            node::modify(
                &self.root,
                self.depth_shift,
                index,
                NodeStrategy::CopyDrop,
                LeafStrategy::Identity,
            )
        };
        Self::collapsed(root, index, self.length - count, self.depth_shift)
    }

    /// Returns a new vector containing the first `count` elements.
    ///
    /// If `count` exceeds the vector's length, returns the entire vector.
    /// Children that fall entirely after the new window are released.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let taken = vector.take(3);
    /// assert_eq!(taken.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    ///
    /// assert_eq!(vector.take(10), vector);
    /// assert!(vector.take(0).is_empty());
    /// ```
    #[must_use]
    pub fn take(&self, count: usize) -> Self {
        if count >= self.length {
            return self.clone();
        }
        if count == 0 {
            return Self::new();
        }

        let index = count - 1;
        let root = if self.are_pointing_to_same_leaf(index, self.length - 1) {
            self.root.clone()
        } else {
            node::modify(
                &self.root,
                self.depth_shift,
                self.offset + index,
                NodeStrategy::CopyTake,
                LeafStrategy::Identity,
            )
        };
        Self::collapsed(root, self.offset, count, self.depth_shift)
    }

    /// Returns a new vector containing elements from index `start` (inclusive)
    /// to index `end` (exclusive).
    ///
    /// `end` is clamped to the length; an empty range yields an empty vector.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..10).collect();
    /// let sliced = vector.slice(2, 5);
    ///
    /// assert_eq!(sliced.len(), 3);
    /// assert_eq!(sliced.get(0), Some(&2));
    /// assert_eq!(sliced.get(2), Some(&4));
    /// ```
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.length);
        if start >= end {
            return Self::new();
        }
        self.take(end).drop_first(start)
    }

    /// Splits the vector at the given index.
    ///
    /// Equivalent to `(self.take(index), self.drop_first(index))`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let (left, right) = vector.split_at(2);
    /// assert_eq!(left.len(), 2);
    /// assert_eq!(right.get(0), Some(&3));
    /// ```
    #[must_use]
    pub fn split_at(&self, index: usize) -> (Self, Self) {
        (self.take(index), self.drop_first(index))
    }

    /// Removes the first element from the vector.
    ///
    /// Returns `None` if the vector is empty, otherwise the remaining vector
    /// and the removed element.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let (remaining, element) = vector.pop_front().unwrap();
    ///
    /// assert_eq!(element, 1);
    /// assert_eq!(remaining.get(0), Some(&2));
    /// ```
    #[must_use]
    pub fn pop_front(&self) -> Option<(Self, T)> {
        let first = self.first()?.clone();
        Some((self.drop_first(1), first))
    }

    /// Removes the last element from the vector.
    ///
    /// Returns `None` if the vector is empty, otherwise the remaining vector
    /// and the removed element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let (remaining, element) = vector.pop_back().unwrap();
    ///
    /// assert_eq!(element, 5);
    /// assert_eq!(remaining.len(), 4);
    /// ```
    #[must_use]
    pub fn pop_back(&self) -> Option<(Self, T)> {
        let last = self.last()?.clone();
        Some((self.take(self.length - 1), last))
    }

    /// Returns a new vector containing the elements of `self` followed by
    /// those of `other`.
    ///
    /// # Complexity
    ///
    /// O(M) amortized, where M is the length of `other`
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        self.append_all(other.iter().cloned())
    }

    /// Returns a new vector containing only the elements that satisfy
    /// `predicate`, in order.
    ///
    /// If every element survives, the result shares the whole trie with
    /// `self`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmapped_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=6).collect();
    /// let evens = vector.filter(|x| x % 2 == 0);
    /// assert_eq!(evens.iter().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
    /// ```
    #[must_use]
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        let mut survivors = Vec::with_capacity(self.length);
        let kept = self.visit(|_, elements| {
            survivors.extend(
                elements
                    .iter()
                    .filter(|element| predicate(*element))
                    .cloned(),
            );
            survivors.len()
        });
        if kept == self.length {
            self.clone()
        } else {
            Self::from_vec(survivors)
        }
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for PersistentVector<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            offset: self.offset,
            length: self.length,
            depth_shift: self.depth_shift,
        }
    }
}

impl<T> Default for PersistentVector<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for PersistentVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone> Extend<T> for PersistentVector<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        *self = self.append_all(iter);
    }
}

impl<T: Clone> IntoIterator for PersistentVector<T> {
    type Item = T;
    type IntoIter = PersistentVectorIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        PersistentVectorIntoIterator::new(self)
    }
}

impl<'a, T> IntoIterator for &'a PersistentVector<T> {
    type Item = &'a T;
    type IntoIter = PersistentVectorIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Index<usize> for PersistentVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(element) => element,
            None => panic!(
                "index out of bounds: the len is {} but the index is {index}",
                self.length
            ),
        }
    }
}

impl<T: PartialEq> PartialEq for PersistentVector<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for PersistentVector<T> {}

/// Hashes the length first, then each element in order, so that equal
/// vectors hash equally regardless of their internal layout.
impl<T: Hash> Hash for PersistentVector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PersistentVector<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentVectorVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentVectorVisitor<T>
where
    T: serde::Deserialize<'de>,
{
    type Value = PersistentVector<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        const MAX_PREALLOCATE: usize = 4096;
        let capacity = seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut elements = Vec::with_capacity(capacity);
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(PersistentVector::from_vec(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentVector<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentVectorVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn collect(vector: &PersistentVector<i32>) -> Vec<i32> {
        vector.iter().copied().collect()
    }

    fn range(start: i32, end: i32) -> PersistentVector<i32> {
        (start..end).collect()
    }

    /// Checks the window invariants that every published vector must satisfy.
    fn assert_well_formed<T>(vector: &PersistentVector<T>) {
        assert_eq!(vector.depth_shift % BITS_PER_LEVEL, 0);
        assert!(
            vector.is_empty()
                || first_digit(vector.offset + vector.length - 1, vector.depth_shift)
                    < BRANCHING_FACTOR
        );
        for index in 0..vector.length {
            assert!(vector.get(index).is_some(), "index {index} unreadable");
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[rstest]
    fn test_new_is_empty_leaf() {
        let vector: PersistentVector<i32> = PersistentVector::new();
        assert!(vector.is_empty());
        assert_eq!(vector.depth_shift, 0);
        assert_eq!(vector.offset, 0);
        assert_eq!(vector.get(0), None);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(32, 1)]
    #[case(33, 2)]
    #[case(1024, 2)]
    #[case(1025, 3)]
    fn test_from_vec_minimal_depth(#[case] size: i32, #[case] depth: usize) {
        let vector = range(0, size);
        assert_eq!(vector.depth(), depth);
        assert_eq!(collect(&vector), (0..size).collect::<Vec<_>>());
    }

    // =========================================================================
    // Append / Prepend Growth
    // =========================================================================

    #[rstest]
    fn test_append_33rd_element_grows_one_level() {
        let mut vector = PersistentVector::new();
        for value in 0..32 {
            vector = vector.append(value);
        }
        assert_eq!(vector.depth_shift, 0);

        let grown = vector.append(32);
        assert_eq!(grown.depth_shift, BITS_PER_LEVEL);
        assert_eq!(grown.len(), 33);
        assert_eq!(grown.get(32), Some(&32));
        assert_eq!(vector.len(), 32);
    }

    #[rstest]
    fn test_prepend_on_empty_grows_left() {
        let vector = PersistentVector::new().prepend(7);
        assert_eq!(vector.depth_shift, BITS_PER_LEVEL);
        assert_eq!(
            vector.offset,
            tree_size(BRANCHING_FACTOR - 1, BITS_PER_LEVEL) - 1
        );
        assert_eq!(collect(&vector), vec![7]);
        assert_well_formed(&vector);
    }

    #[rstest]
    fn test_prepend_fills_leaf_downward_before_growing_again() {
        let mut vector = PersistentVector::new();
        for value in 0..32 {
            vector = vector.prepend(value);
        }
        assert_eq!(vector.depth_shift, BITS_PER_LEVEL);
        assert_eq!(vector.get(0), Some(&31));
        assert_eq!(vector.get(31), Some(&0));
        assert_well_formed(&vector);
    }

    #[rstest]
    fn test_prepend_then_append_use_both_edges() {
        let vector = range(0, 10).prepend_all(-50..0).append_all(10..60);
        assert_eq!(collect(&vector), (-50..60).collect::<Vec<_>>());
        assert_well_formed(&vector);
    }

    #[rstest]
    fn test_append_after_take_overwrites_trailing_garbage() {
        let vector = range(0, 20).take(5).append_all(100..103);
        assert_eq!(collect(&vector), vec![0, 1, 2, 3, 4, 100, 101, 102]);
    }

    #[rstest]
    fn test_prepend_after_drop_overwrites_leading_garbage() {
        let vector = range(0, 20).drop_first(15).prepend_all([-2, -1]);
        assert_eq!(collect(&vector), vec![-2, -1, 15, 16, 17, 18, 19]);
    }

    // =========================================================================
    // Structural Sharing
    // =========================================================================

    #[rstest]
    fn test_update_shares_untouched_subtrees() {
        let vector = range(0, 2000);
        let updated = vector.update(1500, -1).unwrap();

        let old_children = vector.root.as_branch().unwrap();
        let new_children = updated.root.as_branch().unwrap();
        assert_eq!(old_children.len(), new_children.len());
        assert!(ReferenceCounter::ptr_eq(
            old_children[0].as_ref().unwrap(),
            new_children[0].as_ref().unwrap()
        ));
        assert!(!ReferenceCounter::ptr_eq(
            old_children[1].as_ref().unwrap(),
            new_children[1].as_ref().unwrap()
        ));
        assert_eq!(vector.get(1500), Some(&1500));
        assert_eq!(updated.get(1500), Some(&-1));
    }

    #[rstest]
    fn test_drop_first_releases_leading_children() {
        let vector = range(0, 200);
        let dropped = vector.drop_first(100);
        let children = dropped.root.as_branch().unwrap();
        assert!(children[0].is_none());
        assert!(children[1].is_none());
        assert!(children[2].is_none());
        assert!(children[3].is_some());
        assert_eq!(collect(&dropped), (100..200).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_dropped_prefix_is_freed_with_source() {
        let vector = range(0, 200);
        let first_leaf = vector.root.as_branch().unwrap()[0].clone().unwrap();
        assert_eq!(ReferenceCounter::strong_count(&first_leaf), 2);

        let dropped = vector.drop_first(100);
        assert_eq!(ReferenceCounter::strong_count(&first_leaf), 2);
        drop(vector);
        assert_eq!(ReferenceCounter::strong_count(&first_leaf), 1);
        assert_eq!(dropped.first(), Some(&100));
    }

    #[rstest]
    fn test_take_releases_trailing_children() {
        let vector = range(0, 200);
        let taken = vector.take(70);
        assert_eq!(taken.root.as_branch().unwrap().len(), 3);
        assert_eq!(collect(&taken), (0..70).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_drop_first_within_leaf_keeps_root() {
        let vector = range(0, 100);
        let dropped = vector.drop_first(3);
        assert!(ReferenceCounter::ptr_eq(&vector.root, &dropped.root));
        assert_eq!(dropped.offset, 3);
    }

    #[rstest]
    fn test_filter_without_removal_shares_root() {
        let vector = range(0, 100);
        let filtered = vector.filter(|_| true);
        assert!(ReferenceCounter::ptr_eq(&vector.root, &filtered.root));
    }

    #[rstest]
    fn test_clone_shares_root() {
        let vector = range(0, 100);
        let cloned = vector.clone();
        assert!(ReferenceCounter::ptr_eq(&vector.root, &cloned.root));
    }

    // =========================================================================
    // Collapse
    // =========================================================================

    #[rstest]
    fn test_take_into_first_leaf_collapses_to_leaf() {
        let taken = range(0, 2000).take(20);
        assert_eq!(taken.depth_shift, 0);
        assert_eq!(collect(&taken), (0..20).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_drop_into_last_child_collapses() {
        let dropped = range(0, 2000).drop_first(1990);
        assert_eq!(dropped.depth_shift, 0);
        assert_eq!(dropped.offset, last_digit(1990));
        assert_eq!(collect(&dropped), (1990..2000).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_window_spanning_children_does_not_collapse() {
        let window = range(0, 100).slice(10, 50);
        assert_eq!(window.depth_shift, BITS_PER_LEVEL);
        assert_eq!(collect(&window), (10..50).collect::<Vec<_>>());
        assert_well_formed(&window);
    }

    #[rstest]
    fn test_prepend_grown_trie_collapses_after_drop() {
        let vector = range(0, 10).prepend_all(0..40);
        let tail = vector.drop_first(45);
        assert_eq!(tail.depth_shift, 0);
        assert_eq!(collect(&tail), (5..10).collect::<Vec<_>>());
    }

    // =========================================================================
    // Visit / Map / Filter
    // =========================================================================

    #[rstest]
    fn test_visit_yields_visible_runs() {
        let window = range(0, 100).slice(30, 70);
        let mut runs = Vec::new();
        let total = window.visit(|running, elements| {
            runs.push(elements.to_vec());
            running + elements.len()
        });
        assert_eq!(total, 40);
        assert_eq!(runs[0], vec![30, 31]);
        assert_eq!(runs[1], (32..64).collect::<Vec<_>>());
        assert_eq!(runs[2], (64..70).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_visit_on_empty_never_calls_visitor() {
        let vector: PersistentVector<i32> = PersistentVector::new();
        let total = vector.visit(|_, _| panic!("visitor called on empty vector"));
        assert_eq!(total, 0);
    }

    #[rstest]
    fn test_map_over_window() {
        let window = range(0, 100).slice(10, 40);
        let doubled = window.map(|x| x * 2);
        assert_eq!(
            collect(&doubled),
            (10..40).map(|x| x * 2).collect::<Vec<_>>()
        );
        assert_eq!(doubled.offset, 0);
    }

    #[rstest]
    fn test_filter_none_survive() {
        let filtered = range(0, 100).filter(|_| false);
        assert!(filtered.is_empty());
    }

    // =========================================================================
    // Checked Access
    // =========================================================================

    #[rstest]
    fn test_update_out_of_bounds_is_error() {
        let vector = range(0, 10);
        assert_eq!(
            vector.update(10, 0),
            Err(TrieError::IndexOutOfBounds {
                index: 10,
                length: 10
            })
        );
    }

    #[rstest]
    #[should_panic(expected = "index out of bounds: the len is 3 but the index is 3")]
    fn test_index_out_of_bounds_panics() {
        let vector = range(0, 3);
        let _ = vector[3];
    }

    #[rstest]
    fn test_get_does_not_read_garbage_outside_window() {
        let window = range(0, 100).slice(10, 20);
        assert_eq!(window.get(10), None);
        assert_eq!(window.get(9), Some(&19));
    }

    // =========================================================================
    // Display
    // =========================================================================

    #[rstest]
    fn test_display_empty_vector() {
        let vector: PersistentVector<i32> = PersistentVector::new();
        assert_eq!(format!("{vector}"), "[]");
    }

    #[rstest]
    fn test_display_multiple_elements_vector() {
        let vector = range(1, 4);
        assert_eq!(format!("{vector}"), "[1, 2, 3]");
    }
}
