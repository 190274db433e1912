//! Persistent (immutable) vector based on a radix-balanced trie.
//!
//! This module provides [`PersistentVector`], an immutable dynamic array
//! that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! `PersistentVector` is a fixed-fanout trie over contiguous leaf chunks,
//! with the most recent chunk buffered in a separate *tail*. It provides:
//!
//! - O(log N) random access (effectively O(1) for practical sizes)
//! - O(log N) `push_back` (amortized O(1) with the tail buffer)
//! - O(log N) positional `set` / `update`
//! - O(log N) `take` (truncation)
//! - O(1) `len` and `is_empty`
//!
//! All operations return new vectors without modifying the original,
//! and structural sharing ensures memory efficiency.
//!
//! # Internal Structure
//!
//! The vector consists of:
//! - A trunk: an `N`-way branching trie whose leaves are all full
//! - A tail buffer (up to `L` elements) absorbing recent appends
//!
//! # Examples
//!
//! ```rust
//! use radixvec::PersistentVector;
//!
//! let vector: PersistentVector<i32> = PersistentVector::new()
//!     .push_back(1)
//!     .push_back(2)
//!     .push_back(3);
//!
//! assert_eq!(vector.get(0), Some(&1));
//! assert_eq!(vector.get(1), Some(&2));
//! assert_eq!(vector.get(2), Some(&3));
//!
//! // Structural sharing: the original vector is preserved
//! let extended = vector.push_back(4);
//! assert_eq!(vector.len(), 3);     // Original unchanged
//! assert_eq!(extended.len(), 4);   // New vector
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use crate::ReferenceCounter;
use crate::iter::{ChunkIterator, PersistentVectorIntoIterator, PersistentVectorIterator};
use crate::node::Node;
use crate::transient::TransientVector;
use crate::{Const, ValidBranchingConstant};

// =============================================================================
// PersistentVector Definition
// =============================================================================

/// A persistent (immutable) vector based on a radix-balanced trie.
///
/// `PersistentVector` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns. The
/// `N` parameter sets the branch fanout and `L` the leaf capacity; both
/// must be powers of two and default to 32.
///
/// # Time Complexity
///
/// | Operation    | Complexity                      |
/// |--------------|---------------------------------|
/// | `new`        | O(1)                            |
/// | `get`        | O(log N), effectively O(1)      |
/// | `push_back`  | amortized O(1)                  |
/// | `set`        | O(log N), effectively O(1)      |
/// | `update`     | O(log N), effectively O(1)      |
/// | `take`       | O(log N), effectively O(1)      |
/// | `pop_back`   | O(log N), effectively O(1)      |
/// | `len`        | O(1)                            |
/// | `transient`  | O(1)                            |
///
/// # Examples
///
/// ```rust
/// use radixvec::PersistentVector;
///
/// let vector: PersistentVector<i32> = (0..100).collect();
/// assert_eq!(vector.len(), 100);
/// assert_eq!(vector.get(50), Some(&50));
/// ```
#[derive(Clone)]
pub struct PersistentVector<T, const N: usize = 32, const L: usize = 32>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    /// Total number of elements.
    pub(crate) length: usize,
    /// Bit shift of the root level; `LEAF_BITS` when the root's children are
    /// leaves.
    pub(crate) shift: usize,
    /// Root node of the trunk trie.
    pub(crate) root: ReferenceCounter<Node<T, N, L>>,
    /// Tail buffer holding the last `1..=L` elements of a non-empty vector.
    pub(crate) tail: ReferenceCounter<Vec<T>>,
}

impl<T, const N: usize, const L: usize> PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    pub(crate) const BITS: usize = Node::<T, N, L>::BITS;
    pub(crate) const LEAF_BITS: usize = Node::<T, N, L>::LEAF_BITS;
    pub(crate) const MASK: usize = Node::<T, N, L>::MASK;
    pub(crate) const LEAF_MASK: usize = Node::<T, N, L>::LEAF_MASK;

    /// Creates a new empty vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = PersistentVector::new();
    /// assert!(vector.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        PersistentVector {
            length: 0,
            shift: Self::LEAF_BITS,
            root: ReferenceCounter::new(Node::empty_branch()),
            tail: ReferenceCounter::new(Vec::new()),
        }
    }

    /// Creates a vector containing a single element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = PersistentVector::singleton(42);
    /// assert_eq!(vector.len(), 1);
    /// assert_eq!(vector.get(0), Some(&42));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        PersistentVector {
            length: 1,
            shift: Self::LEAF_BITS,
            root: ReferenceCounter::new(Node::empty_branch()),
            tail: ReferenceCounter::new(vec![element]),
        }
    }

    /// Returns the number of elements in the vector.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of elements stored in the trunk, which is also the
    /// index of the first tail element.
    #[inline]
    pub(crate) fn tail_offset(&self) -> usize {
        self.length - self.tail.len()
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
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

        let tail_offset = self.tail_offset();
        if index >= tail_offset {
            self.tail.get(index - tail_offset)
        } else {
            self.root
                .leaf_for(self.shift, index)
                .and_then(|leaf| leaf.get(index & Self::LEAF_MASK))
        }
    }

    /// Returns a reference to the first element, or `None` if the vector is
    /// empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the last element, or `None` if the vector is
    /// empty.
    ///
    /// O(1): the last element always lives in the tail.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.tail.last()
    }

    /// Returns an iterator over references to the elements, front to back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let collected: Vec<&i32> = vector.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3, &4, &5]);
    /// ```
    pub fn iter(&self) -> PersistentVectorIterator<'_, T, N, L> {
        PersistentVectorIterator::new(self.chunks(), self.length)
    }

    /// Returns an iterator over the contiguous chunks of the vector.
    ///
    /// Chunks are yielded in element order; their concatenation is exactly
    /// the vector's contents. No elements are copied.
    pub fn chunks(&self) -> ChunkIterator<'_, T, N, L> {
        ChunkIterator::new(&self.root, self.tail_offset() > 0, self.tail.as_slice())
    }

    /// Applies `function` to every contiguous chunk of elements, in order.
    ///
    /// This is the traversal primitive underlying the element iterators:
    /// each call receives a slice of consecutive elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..100).collect();
    /// let mut total = 0usize;
    /// vector.for_each_chunk(|chunk| total += chunk.len());
    /// assert_eq!(total, 100);
    /// ```
    pub fn for_each_chunk<F>(&self, mut function: F)
    where
        F: FnMut(&[T]),
    {
        for chunk in self.chunks() {
            function(chunk);
        }
    }

    /// Converts this vector into its transient form.
    ///
    /// O(1): no nodes are copied until the transient mutates them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..10).collect();
    /// let mut transient = vector.transient();
    /// transient.push_back(10);
    /// let extended = transient.persistent();
    /// assert_eq!(extended.len(), 11);
    /// ```
    #[must_use]
    pub fn transient(self) -> TransientVector<T, N, L> {
        TransientVector {
            length: self.length,
            shift: self.shift,
            root: self.root,
            tail: self.tail,
        }
    }

    /// Asserts the structural invariants. Test-only.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        fn count_and_check<T, const N: usize, const L: usize>(node: &Node<T, N, L>) -> usize {
            match node {
                Node::Leaf(elements) => {
                    assert_eq!(elements.len(), L, "trunk leaf not full");
                    L
                }
                Node::Branch(children) => {
                    let mut total = 0;
                    let mut prefix_ended = false;
                    for child in children {
                        match child {
                            Some(child) => {
                                assert!(!prefix_ended, "occupied slots must form a prefix");
                                total += count_and_check(child.as_ref());
                            }
                            None => prefix_ended = true,
                        }
                    }
                    total
                }
            }
        }

        assert!(self.tail.len() <= L);
        if self.length == 0 {
            assert!(self.tail.is_empty());
            assert_eq!(self.shift, Self::LEAF_BITS);
        } else {
            assert!(!self.tail.is_empty(), "non-empty vector with empty tail");
        }
        assert!(self.shift >= Self::LEAF_BITS);
        assert_eq!((self.shift - Self::LEAF_BITS) % Self::BITS, 0);

        let tail_offset = self.tail_offset();
        assert_eq!(count_and_check(self.root.as_ref()), tail_offset);
        if self.shift > Self::LEAF_BITS {
            assert!(tail_offset > (1_usize << self.shift), "shift not minimal");
        }
    }
}

impl<T: Clone, const N: usize, const L: usize> PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    /// Appends an element to the back of the vector.
    ///
    /// Returns a new vector with the element at the end; the receiver is
    /// unchanged and shares every untouched node with the result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = PersistentVector::new().push_back(1).push_back(2);
    /// assert_eq!(vector.len(), 2);
    /// assert_eq!(vector.get(1), Some(&2));
    /// ```
    #[must_use]
    pub fn push_back(&self, element: T) -> Self {
        if self.tail.len() < L {
            let mut new_tail = Vec::with_capacity(L);
            new_tail.extend_from_slice(self.tail.as_slice());
            new_tail.push(element);

            PersistentVector {
                length: self.length + 1,
                shift: self.shift,
                root: self.root.clone(),
                tail: ReferenceCounter::new(new_tail),
            }
        } else {
            self.push_tail_to_trunk(element)
        }
    }

    /// Incorporates the full tail into the trunk and starts a fresh tail
    /// with `element`.
    fn push_tail_to_trunk(&self, element: T) -> Self {
        let tail_leaf: Vec<T> = self.tail.as_slice().to_vec();
        let tail_offset = self.tail_offset();
        let mut new_tail = Vec::with_capacity(L);
        new_tail.push(element);

        // The trunk overflows when the insertion offset exceeds the root's
        // addressable range at the current shift.
        if (tail_offset >> self.shift) >= N {
            let mut new_root_children: [Option<ReferenceCounter<Node<T, N, L>>>; N] =
                std::array::from_fn(|_| None);
            new_root_children[0] = Some(self.root.clone());
            new_root_children[1] = Some(ReferenceCounter::new(Node::new_path(
                self.shift, tail_leaf,
            )));

            PersistentVector {
                length: self.length + 1,
                shift: self.shift + Self::BITS,
                root: ReferenceCounter::new(Node::Branch(new_root_children)),
                tail: ReferenceCounter::new(new_tail),
            }
        } else {
            let new_root =
                self.push_tail_into_node(&self.root, self.shift, tail_offset, tail_leaf);

            PersistentVector {
                length: self.length + 1,
                shift: self.shift,
                root: ReferenceCounter::new(new_root),
                tail: ReferenceCounter::new(new_tail),
            }
        }
    }

    /// Copies the spine from `node` down to the insertion point of the tail
    /// leaf, sharing every sibling off the write path.
    fn push_tail_into_node(
        &self,
        node: &ReferenceCounter<Node<T, N, L>>,
        level: usize,
        tail_offset: usize,
        tail_node: Vec<T>,
    ) -> Node<T, N, L> {
        let Node::Branch(children) = node.as_ref() else {
            unreachable!("leaf on the trunk spine");
        };
        let slot = (tail_offset >> level) & Self::MASK;
        let mut new_children = children.clone();

        if level == Self::LEAF_BITS {
            new_children[slot] = Some(ReferenceCounter::new(Node::Leaf(tail_node)));
        } else {
            let child = match &children[slot] {
                Some(child) => {
                    self.push_tail_into_node(child, level - Self::BITS, tail_offset, tail_node)
                }
                None => Node::new_path(level - Self::BITS, tail_node),
            };
            new_children[slot] = Some(ReferenceCounter::new(child));
        }

        Node::Branch(new_children)
    }

    /// Replaces the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds, otherwise a new vector
    /// with the replaced element. Only the nodes along the write path are
    /// copied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let updated = vector.set(2, 100).unwrap();
    ///
    /// assert_eq!(updated.get(2), Some(&100));
    /// assert_eq!(vector.get(2), Some(&3)); // Original unchanged
    /// ```
    #[must_use]
    pub fn set(&self, index: usize, element: T) -> Option<Self> {
        if index >= self.length {
            return None;
        }

        let tail_offset = self.tail_offset();
        if index >= tail_offset {
            let mut new_tail = self.tail.as_slice().to_vec();
            new_tail[index - tail_offset] = element;

            Some(PersistentVector {
                length: self.length,
                shift: self.shift,
                root: self.root.clone(),
                tail: ReferenceCounter::new(new_tail),
            })
        } else {
            let new_root = self.set_in_trunk(&self.root, self.shift, index, element);

            Some(PersistentVector {
                length: self.length,
                shift: self.shift,
                root: ReferenceCounter::new(new_root),
                tail: self.tail.clone(),
            })
        }
    }

    /// Clones the radix path to `index` and overwrites the target slot.
    fn set_in_trunk(
        &self,
        node: &ReferenceCounter<Node<T, N, L>>,
        level: usize,
        index: usize,
        element: T,
    ) -> Node<T, N, L> {
        match node.as_ref() {
            Node::Branch(children) => {
                let slot = (index >> level) & Self::MASK;
                let mut new_children = children.clone();
                let child = children[slot].as_ref().expect("radix path ends early");
                new_children[slot] = Some(ReferenceCounter::new(self.set_in_trunk(
                    child,
                    level.saturating_sub(Self::BITS),
                    index,
                    element,
                )));
                Node::Branch(new_children)
            }
            Node::Leaf(elements) => {
                let mut new_elements = elements.clone();
                new_elements[index & Self::LEAF_MASK] = element;
                Node::Leaf(new_elements)
            }
        }
    }

    /// Replaces the element at `index` with `function` applied to it.
    ///
    /// Returns `None` if the index is out of bounds. The replacement is
    /// computed before any node is copied, so a panicking `function` leaves
    /// no observable trace.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..10).collect();
    /// let updated = vector.update(3, |value| value * 10).unwrap();
    /// assert_eq!(updated.get(3), Some(&30));
    /// ```
    #[must_use]
    pub fn update<F>(&self, index: usize, function: F) -> Option<Self>
    where
        F: FnOnce(&T) -> T,
    {
        let element = function(self.get(index)?);
        self.set(index, element)
    }

    /// Returns a vector containing only the first `min(count, len)` elements.
    ///
    /// `take(0)` returns the empty vector; `take(count)` for
    /// `count >= len` returns the vector unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..100).collect();
    /// let truncated = vector.take(10);
    ///
    /// assert_eq!(truncated.len(), 10);
    /// assert_eq!(truncated.get(9), Some(&9));
    /// assert_eq!(vector.len(), 100); // Original unchanged
    /// ```
    #[must_use]
    pub fn take(&self, count: usize) -> Self {
        if count >= self.length {
            return self.clone();
        }
        if count == 0 {
            return Self::new();
        }

        let tail_offset = self.tail_offset();
        if count > tail_offset {
            // The cut lands inside the tail; the trunk is untouched.
            return PersistentVector {
                length: count,
                shift: self.shift,
                root: self.root.clone(),
                tail: ReferenceCounter::new(self.tail[..count - tail_offset].to_vec()),
            };
        }

        // The leaf holding the last surviving element becomes the new tail.
        let cut = ((count - 1) >> Self::LEAF_BITS) << Self::LEAF_BITS;
        let leaf = self
            .root
            .leaf_for(self.shift, count - 1)
            .expect("trunk leaf missing");
        let new_tail = leaf[..count - cut].to_vec();

        if cut == 0 {
            return PersistentVector {
                length: count,
                shift: Self::LEAF_BITS,
                root: ReferenceCounter::new(Node::empty_branch()),
                tail: ReferenceCounter::new(new_tail),
            };
        }

        let mut root = ReferenceCounter::new(Self::truncate_node(&self.root, self.shift, cut));
        let mut shift = self.shift;
        while shift > Self::LEAF_BITS && cut <= (1_usize << shift) {
            // Single-child root: unhoist it to restore shift minimality.
            let child = {
                let Node::Branch(children) = root.as_ref() else {
                    unreachable!("leaf as trunk root");
                };
                children[0].as_ref().expect("single-child root").clone()
            };
            root = child;
            shift -= Self::BITS;
        }

        PersistentVector {
            length: count,
            shift,
            root,
            tail: ReferenceCounter::new(new_tail),
        }
    }

    /// Copies the rightmost spine for a trunk of `count` elements, sharing
    /// every surviving subtree to its left.
    fn truncate_node(
        node: &ReferenceCounter<Node<T, N, L>>,
        level: usize,
        count: usize,
    ) -> Node<T, N, L> {
        let Node::Branch(children) = node.as_ref() else {
            unreachable!("trunk truncation reached a leaf");
        };
        let last = (count - 1) >> level;
        let mut new_children: [Option<ReferenceCounter<Node<T, N, L>>>; N] =
            std::array::from_fn(|_| None);
        for (slot, child) in children.iter().take(last + 1).enumerate() {
            new_children[slot] = child.clone();
        }

        if level > Self::LEAF_BITS {
            let kept = count - (last << level);
            if kept < (1_usize << level) {
                let child = children[last].as_ref().expect("radix path ends early");
                new_children[last] = Some(ReferenceCounter::new(Self::truncate_node(
                    child,
                    level - Self::BITS,
                    kept,
                )));
            }
        }

        Node::Branch(new_children)
    }

    /// Removes the last element from the vector.
    ///
    /// Returns `None` if the vector is empty, otherwise the new vector and
    /// the removed element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let (remaining, element) = vector.pop_back().unwrap();
    ///
    /// assert_eq!(element, 5);
    /// assert_eq!(remaining.len(), 4);
    /// ```
    #[must_use]
    pub fn pop_back(&self) -> Option<(Self, T)> {
        let element = self.last()?.clone();
        Some((self.take(self.length - 1), element))
    }

    /// Creates a vector from a slice of elements.
    ///
    /// Builds the trunk bottom-up, which is considerably faster than
    /// repeated `push_back`.
    #[must_use]
    pub fn from_slice(elements: &[T]) -> Self {
        Self::from_vec(elements.to_vec())
    }

    /// Appends every element of `elements` to the back of the vector.
    ///
    /// The batch is routed through a transient, so shared nodes are copied
    /// at most once regardless of the batch size.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..3).collect();
    /// let extended = vector.push_back_many(3..6);
    /// assert_eq!(extended.len(), 6);
    /// assert_eq!(extended.get(5), Some(&5));
    /// ```
    #[must_use]
    pub fn push_back_many<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut transient = self.clone().transient();
        transient.extend(elements);
        transient.persistent()
    }

    /// Appends another vector to this vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::PersistentVector;
    ///
    /// let left: PersistentVector<i32> = (1..=3).collect();
    /// let right: PersistentVector<i32> = (4..=6).collect();
    /// let combined = left.concat(&right);
    ///
    /// assert_eq!(combined.len(), 6);
    /// assert_eq!(combined.get(5), Some(&6));
    /// ```
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        self.push_back_many(other.iter().cloned())
    }

    // =========================================================================
    // In-place variants for owned values
    // =========================================================================

    /// `push_back` for an owned vector.
    ///
    /// Nodes owned exclusively by this value are reused in place; nodes
    /// still shared with other versions are copied, exactly as `push_back`
    /// would. Observationally identical to `push_back`.
    #[must_use]
    pub fn push_back_owned(self, element: T) -> Self {
        let mut transient = self.transient();
        transient.push_back(element);
        transient.persistent()
    }

    /// `set` for an owned vector; reuses uniquely-owned nodes in place.
    ///
    /// Returns `None` (consuming the vector) if the index is out of bounds.
    #[must_use]
    pub fn set_owned(self, index: usize, element: T) -> Option<Self> {
        let mut transient = self.transient();
        transient
            .set(index, element)
            .then(|| transient.persistent())
    }

    /// `update` for an owned vector; reuses uniquely-owned nodes in place.
    ///
    /// Returns `None` (consuming the vector) if the index is out of bounds.
    #[must_use]
    pub fn update_owned<F>(self, index: usize, function: F) -> Option<Self>
    where
        F: FnOnce(&T) -> T,
    {
        let mut transient = self.transient();
        transient
            .update(index, function)
            .then(|| transient.persistent())
    }

    /// `take` for an owned vector; reuses uniquely-owned nodes in place.
    #[must_use]
    pub fn take_owned(self, count: usize) -> Self {
        let mut transient = self.transient();
        transient.take(count);
        transient.persistent()
    }
}

// =============================================================================
// Bulk Construction
// =============================================================================

impl<T, const N: usize, const L: usize> PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    /// Builds a vector from owned elements without requiring `Clone`.
    fn from_vec(mut elements: Vec<T>) -> Self {
        let length = elements.len();
        if length == 0 {
            return Self::new();
        }
        if length <= L {
            return PersistentVector {
                length,
                shift: Self::LEAF_BITS,
                root: ReferenceCounter::new(Node::empty_branch()),
                tail: ReferenceCounter::new(elements),
            };
        }

        // The tail keeps 1..=L elements; the trunk gets a multiple of L.
        let tail_size = ((length - 1) % L) + 1;
        let tail_elements = elements.split_off(length - tail_size);
        let (root, shift) = Self::build_trunk(elements);

        PersistentVector {
            length,
            shift,
            root,
            tail: ReferenceCounter::new(tail_elements),
        }
    }

    /// Builds the trunk bottom-up from a positive multiple of `L` elements.
    fn build_trunk(elements: Vec<T>) -> (ReferenceCounter<Node<T, N, L>>, usize) {
        let mut leaves: Vec<ReferenceCounter<Node<T, N, L>>> =
            Vec::with_capacity(elements.len() / L);
        let mut elements = elements.into_iter();
        loop {
            let chunk: Vec<T> = elements.by_ref().take(L).collect();
            if chunk.is_empty() {
                break;
            }
            leaves.push(ReferenceCounter::new(Node::Leaf(chunk)));
        }

        let mut current_level = leaves;
        let mut shift = Self::LEAF_BITS;
        while current_level.len() > N {
            let mut next_level: Vec<ReferenceCounter<Node<T, N, L>>> =
                Vec::with_capacity(current_level.len().div_ceil(N));
            for group in current_level.chunks(N) {
                let mut children: [Option<ReferenceCounter<Node<T, N, L>>>; N] =
                    std::array::from_fn(|_| None);
                for (slot, node) in group.iter().enumerate() {
                    children[slot] = Some(node.clone());
                }
                next_level.push(ReferenceCounter::new(Node::Branch(children)));
            }
            current_level = next_level;
            shift += Self::BITS;
        }

        let mut root_children: [Option<ReferenceCounter<Node<T, N, L>>>; N] =
            std::array::from_fn(|_| None);
        for (slot, node) in current_level.into_iter().enumerate() {
            root_children[slot] = Some(node);
        }
        (ReferenceCounter::new(Node::Branch(root_children)), shift)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T, const N: usize, const L: usize> Default for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    #[inline]
    fn default() -> Self {
        PersistentVector::new()
    }
}

impl<T, const N: usize, const L: usize> FromIterator<T> for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone, const N: usize, const L: usize> IntoIterator for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    type Item = T;
    type IntoIter = PersistentVectorIntoIterator<T, N, L>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        PersistentVectorIntoIterator::new(self)
    }
}

impl<'a, T, const N: usize, const L: usize> IntoIterator for &'a PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    type Item = &'a T;
    type IntoIter = PersistentVectorIterator<'a, T, N, L>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq, const N: usize, const L: usize> PartialEq for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.iter().zip(other.iter()).all(|(left, right)| left == right)
    }
}

impl<T: Eq, const N: usize, const L: usize> Eq for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
}

impl<T: Hash, const N: usize, const L: usize> Hash for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: PartialOrd, const N: usize, const L: usize> PartialOrd for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, const N: usize, const L: usize> Ord for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: fmt::Debug, const N: usize, const L: usize> fmt::Debug for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T, const N: usize, const L: usize> Index<usize> for PersistentVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).expect("index out of range")
    }
}

// =============================================================================
// Tests
// =============================================================================
