//! Forward cursors over a [`PersistentVector`].
//!
//! Both cursors cache the visible run of the current leaf and descend from the
//! root again only when that run is exhausted, so a full traversal performs
//! one descent per leaf instead of one per element.

use std::iter::FusedIterator;
use std::ops::Range;

use super::ReferenceCounter;
use super::node::Node;
use super::vector::PersistentVector;

// =============================================================================
// Borrowing Iterator
// =============================================================================

/// An iterator over references to the elements of a [`PersistentVector`].
///
/// Created by [`PersistentVector::iter`] and [`PersistentVector::iter_from`].
///
/// # Examples
///
/// ```rust
/// use bitmapped_trie::persistent::PersistentVector;
///
/// let vector: PersistentVector<i32> = (0..100).collect();
/// let mut iterator = vector.iter().skip(60);
///
/// assert_eq!(iterator.next(), Some(&60));
/// assert_eq!(iterator.len(), 39);
/// ```
pub struct PersistentVectorIterator<'a, T> {
    /// The vector being traversed
    vector: &'a PersistentVector<T>,
    /// Logical index of the first element after the cached run
    index: usize,
    /// Remaining visible elements of the current leaf
    run: std::slice::Iter<'a, T>,
}

impl<'a, T> PersistentVectorIterator<'a, T> {
    pub(crate) fn new(vector: &'a PersistentVector<T>, start: usize) -> Self {
        Self {
            vector,
            index: start.min(vector.len()),
            run: Default::default(),
        }
    }

    /// Logical index of the element the next call to `next` returns.
    #[inline]
    fn next_index(&self) -> usize {
        self.index - self.run.len()
    }
}

impl<'a, T> Iterator for PersistentVectorIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(element) = self.run.next() {
            return Some(element);
        }
        if self.index >= self.vector.len() {
            return None;
        }
        let run = self.vector.leaf_run(self.index);
        self.index += run.len();
        self.run = run.iter();
        self.run.next()
    }

    /// Skips `count` elements, re-resolving the cached leaf only when the new
    /// position lies outside it.
    fn nth(&mut self, count: usize) -> Option<Self::Item> {
        if count < self.run.len() {
            return self.run.nth(count);
        }
        let target = self.next_index().saturating_add(count);
        self.run = Default::default();
        self.index = target.min(self.vector.len());
        self.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len() - self.next_index();
        (remaining, Some(remaining))
    }

    #[inline]
    fn count(self) -> usize {
        self.len()
    }
}

impl<T> ExactSizeIterator for PersistentVectorIterator<'_, T> {}

impl<T> FusedIterator for PersistentVectorIterator<'_, T> {}

// =============================================================================
// Owning Iterator
// =============================================================================

/// An owning iterator over the elements of a [`PersistentVector`].
///
/// The vector is kept alive by the iterator; elements are cloned out of the
/// shared leaves as they are returned.
pub struct PersistentVectorIntoIterator<T> {
    /// The vector being traversed (an O(1) handle)
    vector: PersistentVector<T>,
    /// Logical index of the element returned next
    index: usize,
    /// Leaf holding the cached run
    leaf: Option<ReferenceCounter<Node<T>>>,
    /// Remaining positions of the cached run inside the leaf's element buffer
    window: Range<usize>,
}

impl<T: Clone> PersistentVectorIntoIterator<T> {
    pub(crate) fn new(vector: PersistentVector<T>) -> Self {
        Self {
            vector,
            index: 0,
            leaf: None,
            window: 0..0,
        }
    }

    fn refill(&mut self) {
        let (owner, window) = self.vector.leaf_window(self.index);
        self.leaf = Some(owner.clone());
        self.window = window;
    }
}

impl<T: Clone> Iterator for PersistentVectorIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.len() {
            self.leaf = None;
            return None;
        }
        if self.window.is_empty() {
            self.refill();
        }
        let position = self.window.next()?;
        self.index += 1;
        self.leaf
            .as_deref()
            .and_then(Node::as_leaf)
            .map(|leaf| leaf.elements()[position].clone())
    }

    fn nth(&mut self, count: usize) -> Option<Self::Item> {
        if count < self.window.len() {
            self.window.start += count;
            self.index += count;
        } else {
            self.index = self.index.saturating_add(count).min(self.vector.len());
            self.window = 0..0;
        }
        self.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for PersistentVectorIntoIterator<T> {}

impl<T: Clone> FusedIterator for PersistentVectorIntoIterator<T> {}

// =============================================================================
// Tests
// =============================================================================
