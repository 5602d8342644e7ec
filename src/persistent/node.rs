//! Nodes of the bit-mapped vector trie and the path-copying descent.
//!
//! A trie of depth shift `s` addresses `32 << s` slots. An absolute index is
//! split into base-32 digits: the root consumes `(index >> s) & 31`, each level
//! below consumes the next five bits, and the leaf consumes `index & 31`.
//!
//! Nodes are frozen the moment they are linked into a published root. Every
//! mutation builds fresh, uniquely owned buffers along a single root-to-leaf
//! path and shares every sibling subtree with the source trie.

use arrayvec::ArrayVec;
use static_assertions::const_assert;

use super::ReferenceCounter;

// =============================================================================
// Constants
// =============================================================================

/// Bits consumed per level of the trie.
pub(crate) const BITS_PER_LEVEL: usize = 5;

/// Branching factor (2^5 = 32).
pub(crate) const BRANCHING_FACTOR: usize = 1 << BITS_PER_LEVEL;

/// Bit mask for extracting a single digit.
pub(crate) const MASK: usize = BRANCHING_FACTOR - 1;

/// Upper bound on the number of branch levels needed to address any `usize`.
pub(crate) const MAX_LEVELS: usize = (usize::BITS as usize).div_ceil(BITS_PER_LEVEL);

const_assert!(MAX_LEVELS * BITS_PER_LEVEL >= usize::BITS as usize);

// =============================================================================
// Digit Arithmetic
// =============================================================================

#[inline]
pub(crate) const fn first_digit(index: usize, shift: usize) -> usize {
    index >> shift
}

#[inline]
pub(crate) const fn digit(index: usize, shift: usize) -> usize {
    first_digit(index, shift) & MASK
}

#[inline]
pub(crate) const fn last_digit(index: usize) -> usize {
    index & MASK
}

/// Number of slots covered by `branch_count` children of a node at `shift`.
#[inline]
pub(crate) const fn tree_size(branch_count: usize, shift: usize) -> usize {
    branch_count << shift
}

// =============================================================================
// Node Definition
// =============================================================================

/// A child slot of a branch. Absent slots lie outside every visible window.
pub(crate) type Child<T> = Option<ReferenceCounter<Node<T>>>;

/// A node of the trie.
pub(crate) enum Node<T> {
    /// Up to 32 children. Only the edges of a level may be shorter than 32.
    Branch(Box<[Child<T>]>),
    /// Elements stored directly.
    Leaf(Leaf<T>),
}

impl<T> Node<T> {
    #[inline]
    pub(crate) fn as_branch(&self) -> Option<&[Child<T>]> {
        match self {
            Self::Branch(children) => Some(children),
            Self::Leaf(_) => None,
        }
    }

    #[inline]
    pub(crate) const fn as_leaf(&self) -> Option<&Leaf<T>> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Branch(_) => None,
        }
    }
}

/// A dense run of elements occupying slots `[start, start + len)` of a leaf.
///
/// Slots outside the run were never written, or belong to a region that a
/// slicing operation made invisible.
pub(crate) struct Leaf<T> {
    start: usize,
    elements: Box<[T]>,
}

impl<T> Leaf<T> {
    pub(crate) fn empty() -> Self {
        Self {
            start: 0,
            elements: Box::new([]),
        }
    }

    pub(crate) fn new(start: usize, elements: Vec<T>) -> Self {
        debug_assert!(start + elements.len() <= BRANCHING_FACTOR);
        Self {
            start,
            elements: elements.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) const fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub(crate) const fn end(&self) -> usize {
        self.start + self.elements.len()
    }

    #[inline]
    pub(crate) fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Returns the element stored at `slot`, if the run covers it.
    #[inline]
    pub(crate) fn get(&self, slot: usize) -> Option<&T> {
        slot.checked_sub(self.start)
            .and_then(|position| self.elements.get(position))
    }

    #[inline]
    pub(crate) fn covers(&self, slot: usize) -> bool {
        self.start <= slot && slot < self.end()
    }
}

impl<T: Clone> Leaf<T> {
    /// Copies the leaf with `slot` overwritten.
    fn updated(&self, slot: usize, element: T) -> Self {
        assert!(
            self.covers(slot),
            "update of slot {slot} outside leaf run {}..{}",
            self.start,
            self.end()
        );
        let mut elements = self.elements.to_vec();
        elements[slot - self.start] = element;
        Self::new(self.start, elements)
    }

    /// Writes `chunk` into slots starting at `first_slot`, keeping the
    /// existing elements below it.
    fn appended(
        current: Option<&Self>,
        first_slot: usize,
        chunk: ArrayVec<T, BRANCHING_FACTOR>,
    ) -> Self {
        match current {
            Some(leaf) if leaf.start <= first_slot && first_slot <= leaf.end() => {
                let kept = &leaf.elements[..first_slot - leaf.start];
                let mut elements = Vec::with_capacity(kept.len() + chunk.len());
                elements.extend_from_slice(kept);
                elements.extend(chunk);
                Self::new(leaf.start, elements)
            }
            _ => Self::new(first_slot, chunk.into_iter().collect()),
        }
    }

    /// Writes `chunk` into the slots ending at `last_slot`, keeping the
    /// existing elements above it.
    fn prepended(
        current: Option<&Self>,
        last_slot: usize,
        chunk: ArrayVec<T, BRANCHING_FACTOR>,
    ) -> Self {
        let boundary = last_slot + 1;
        let start = boundary - chunk.len();
        let mut elements: Vec<T> = Vec::with_capacity(BRANCHING_FACTOR - start);
        elements.extend(chunk);
        if let Some(leaf) = current
            && leaf.start <= boundary
            && boundary <= leaf.end()
        {
            elements.extend_from_slice(&leaf.elements[boundary - leaf.start..]);
        }
        Self::new(start, elements)
    }
}

// =============================================================================
// Descent Strategies
// =============================================================================

/// How a branch on the descent path is copied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeStrategy {
    /// Copy every slot, padding with absent slots up to the digit.
    CopyNode,
    /// Copy the slots from the digit onward and release those before it.
    CopyDrop,
    /// Copy the slots up to and including the digit.
    CopyTake,
}

impl NodeStrategy {
    /// Builds the writable copy of `node` for a descent through `position`.
    ///
    /// The returned buffer always has a slot at `position`.
    fn copy<T>(self, node: Option<&Node<T>>, position: usize) -> Vec<Child<T>> {
        let children = node.and_then(Node::as_branch).unwrap_or(&[]);
        let mut copy: Vec<Child<T>> = match self {
            Self::CopyNode => children.to_vec(),
            Self::CopyDrop => children
                .iter()
                .enumerate()
                .map(|(slot, child)| child.clone().filter(|_| slot >= position))
                .collect(),
            Self::CopyTake => children.iter().take(position + 1).cloned().collect(),
        };
        if copy.len() <= position {
            copy.resize(position + 1, None);
        }
        copy
    }
}

/// What happens to the leaf at the end of the descent path.
pub(crate) enum LeafStrategy<T> {
    /// Reuse the leaf as is.
    Identity,
    /// Replace a single slot.
    Update(T),
    /// Fill slots upward from the target slot.
    Append(ArrayVec<T, BRANCHING_FACTOR>),
    /// Fill slots downward from the target slot, in ascending order.
    Prepend(ArrayVec<T, BRANCHING_FACTOR>),
}

impl<T: Clone> LeafStrategy<T> {
    fn apply(
        self,
        current: Option<&ReferenceCounter<Node<T>>>,
        slot: usize,
    ) -> ReferenceCounter<Node<T>> {
        let leaf = current.and_then(|node| node.as_leaf());
        let rebuilt = match self {
            Self::Identity => {
                return match current {
                    Some(node) => node.clone(),
                    None => panic!("identity descent reached an absent leaf at slot {slot}"),
                };
            }
            Self::Update(element) => {
                let Some(leaf) = leaf else {
                    panic!("update descent reached an absent leaf at slot {slot}");
                };
                leaf.updated(slot, element)
            }
            Self::Append(chunk) => Leaf::appended(leaf, slot, chunk),
            Self::Prepend(chunk) => Leaf::prepended(leaf, slot, chunk),
        };
        ReferenceCounter::new(Node::Leaf(rebuilt))
    }
}

// =============================================================================
// Descent
// =============================================================================

/// Path-copying descent.
///
/// Returns a new root in which every branch on the path to `index` has been
/// copied with `node_strategy` and the leaf has been rebuilt with
/// `leaf_strategy`. Every subtree off the path is shared with `root`.
pub(crate) fn modify<T: Clone>(
    root: &ReferenceCounter<Node<T>>,
    depth_shift: usize,
    index: usize,
    node_strategy: NodeStrategy,
    leaf_strategy: LeafStrategy<T>,
) -> ReferenceCounter<Node<T>> {
    if depth_shift == 0 {
        return leaf_strategy.apply(Some(root), last_digit(index));
    }

    let mut path: ArrayVec<(Vec<Child<T>>, usize), MAX_LEVELS> = ArrayVec::new();
    let mut current: Child<T> = Some(root.clone());
    let mut shift = depth_shift;

    while shift > 0 {
        let position = digit(index, shift);
        let children = node_strategy.copy(current.as_deref(), position);
        current = children[position].clone();
        path.push((children, position));
        shift -= BITS_PER_LEVEL;
    }

    let mut rebuilt = leaf_strategy.apply(current.as_ref(), last_digit(index));
    while let Some((mut children, position)) = path.pop() {
        children[position] = Some(rebuilt);
        rebuilt = ReferenceCounter::new(Node::Branch(children.into_boxed_slice()));
    }
    rebuilt
}

/// Read-only descent to the node owning absolute `index`.
pub(crate) fn leaf_node_at<T>(
    root: &ReferenceCounter<Node<T>>,
    depth_shift: usize,
    index: usize,
) -> Option<&ReferenceCounter<Node<T>>> {
    let mut node = root;
    let mut shift = depth_shift;
    while shift > 0 {
        node = node.as_branch()?.get(digit(index, shift))?.as_ref()?;
        shift -= BITS_PER_LEVEL;
    }
    Some(node)
}

#[inline]
pub(crate) fn leaf_at<T>(
    root: &ReferenceCounter<Node<T>>,
    depth_shift: usize,
    index: usize,
) -> Option<&Leaf<T>> {
    leaf_node_at(root, depth_shift, index)?.as_leaf()
}

/// Wraps `root` as the only child of a new top level.
pub(crate) fn grow_right<T>(root: ReferenceCounter<Node<T>>) -> ReferenceCounter<Node<T>> {
    ReferenceCounter::new(Node::Branch(vec![Some(root)].into_boxed_slice()))
}

/// Wraps `root` as the last child of a new, otherwise empty top level.
pub(crate) fn grow_left<T>(root: ReferenceCounter<Node<T>>) -> ReferenceCounter<Node<T>> {
    let mut children: Vec<Child<T>> = vec![None; BRANCHING_FACTOR];
    children[MASK] = Some(root);
    ReferenceCounter::new(Node::Branch(children.into_boxed_slice()))
}

// =============================================================================
// Bulk Construction
// =============================================================================

/// Packs `elements` left to right into a minimal-height trie.
///
/// Returns the root and its depth shift.
pub(crate) fn grouped<T>(elements: Vec<T>) -> (ReferenceCounter<Node<T>>, usize) {
    if elements.len() <= BRANCHING_FACTOR {
        return (ReferenceCounter::new(Node::Leaf(Leaf::new(0, elements))), 0);
    }

    let mut level: Vec<ReferenceCounter<Node<T>>> =
        Vec::with_capacity(elements.len().div_ceil(BRANCHING_FACTOR));
    let mut remaining = elements.into_iter();
    loop {
        let chunk: Vec<T> = remaining.by_ref().take(BRANCHING_FACTOR).collect();
        if chunk.is_empty() {
            break;
        }
        level.push(ReferenceCounter::new(Node::Leaf(Leaf::new(0, chunk))));
    }

    let mut shift = BITS_PER_LEVEL;
    while level.len() > BRANCHING_FACTOR {
        level = level
            .chunks(BRANCHING_FACTOR)
            .map(|chunk| {
                ReferenceCounter::new(Node::Branch(chunk.iter().cloned().map(Some).collect()))
            })
            .collect();
        shift += BITS_PER_LEVEL;
    }

    let root = Node::Branch(level.into_iter().map(Some).collect());
    (ReferenceCounter::new(root), shift)
}

// =============================================================================
// Tests
// =============================================================================
