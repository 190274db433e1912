//! Transient (ephemerally mutable) form of the persistent vector.
//!
//! A [`TransientVector`] is the same trie as a [`PersistentVector`], made
//! mutable for batched construction. Every mutating operation follows one
//! rule per node on its write path: a node owned exclusively by this
//! transient is mutated in place; a node still shared with any persistent
//! version is cloned first, and the clone — now exclusively owned — is
//! mutated. Shared ownership is the mutation license: no persistent value
//! can ever observe a change, and a batch of appends copies each shared
//! node at most once instead of once per operation.
//!
//! Transients are single-owner values; converting one back with
//! [`persistent`](TransientVector::persistent) consumes it, so a retired
//! transient cannot keep mutating the published result.
//!
//! # Examples
//!
//! ```rust
//! use radixvec::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..3).collect();
//! let mut transient = vector.transient();
//! for element in 3..100 {
//!     transient.push_back(element);
//! }
//! let built = transient.persistent();
//! assert_eq!(built.len(), 100);
//! ```

use std::fmt;

use crate::ReferenceCounter;
use crate::node::Node;
use crate::vector::PersistentVector;
use crate::{Const, ValidBranchingConstant};

/// An ephemerally mutable vector sharing its structure with the persistent
/// version it was created from.
///
/// Mutating operations have the same semantics as their
/// [`PersistentVector`] counterparts but mutate `self` instead of
/// returning a new value. Not safe to use from multiple threads
/// concurrently, and `Clone` is deliberately not implemented.
pub struct TransientVector<T, const N: usize = 32, const L: usize = 32>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    pub(crate) length: usize,
    pub(crate) shift: usize,
    pub(crate) root: ReferenceCounter<Node<T, N, L>>,
    pub(crate) tail: ReferenceCounter<Vec<T>>,
}

impl<T, const N: usize, const L: usize> TransientVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    const BITS: usize = Node::<T, N, L>::BITS;
    const LEAF_BITS: usize = Node::<T, N, L>::LEAF_BITS;
    const LEAF_MASK: usize = Node::<T, N, L>::LEAF_MASK;

    /// Creates a new empty transient.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        PersistentVector::new().transient()
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if there are no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    fn tail_offset(&self) -> usize {
        self.length - self.tail.len()
    }

    /// Returns a reference to the element at the given index, or `None` if
    /// the index is out of bounds.
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

    /// Converts this transient back into a persistent vector.
    ///
    /// O(1). Consumes the transient: once the persistent value is
    /// published, no further mutation can reach it through this token.
    #[must_use]
    pub fn persistent(self) -> PersistentVector<T, N, L> {
        PersistentVector {
            length: self.length,
            shift: self.shift,
            root: self.root,
            tail: self.tail,
        }
    }
}

impl<T: Clone, const N: usize, const L: usize> TransientVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    /// Appends an element in place.
    ///
    /// When the tail fills up it is moved into the trunk, growing the root
    /// by one level if the trunk is at capacity.
    pub fn push_back(&mut self, element: T) {
        if self.tail.len() == L {
            let full_tail = std::mem::replace(
                &mut self.tail,
                ReferenceCounter::new(Vec::with_capacity(L)),
            );
            let leaf = ReferenceCounter::unwrap_or_clone(full_tail);
            let tail_offset = self.length - L;

            if (tail_offset >> self.shift) >= N {
                let mut new_root_children: [Option<ReferenceCounter<Node<T, N, L>>>; N] =
                    std::array::from_fn(|_| None);
                new_root_children[0] = Some(self.root.clone());
                new_root_children[1] =
                    Some(ReferenceCounter::new(Node::new_path(self.shift, leaf)));
                self.root = ReferenceCounter::new(Node::Branch(new_root_children));
                self.shift += Self::BITS;
            } else {
                ReferenceCounter::make_mut(&mut self.root).push_leaf_in_place(
                    self.shift,
                    tail_offset,
                    leaf,
                );
            }
        }

        ReferenceCounter::make_mut(&mut self.tail).push(element);
        self.length += 1;
    }

    /// Replaces the element at the given index in place.
    ///
    /// Returns `false` (leaving the transient untouched) if the index is
    /// out of bounds.
    pub fn set(&mut self, index: usize, element: T) -> bool {
        if index >= self.length {
            return false;
        }

        let tail_offset = self.tail_offset();
        if index >= tail_offset {
            ReferenceCounter::make_mut(&mut self.tail)[index - tail_offset] = element;
        } else {
            ReferenceCounter::make_mut(&mut self.root).set_in_place(self.shift, index, element);
        }
        true
    }

    /// Replaces the element at `index` with `function` applied to it.
    ///
    /// Returns `false` if the index is out of bounds. The replacement is
    /// computed before any node is touched, so a panicking `function`
    /// leaves the transient in its prior state.
    pub fn update<F>(&mut self, index: usize, function: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let element = match self.get(index) {
            Some(current) => function(current),
            None => return false,
        };
        self.set(index, element)
    }

    /// Truncates to the first `min(count, len)` elements in place.
    pub fn take(&mut self, count: usize) {
        if count >= self.length {
            return;
        }
        if count == 0 {
            self.length = 0;
            self.shift = Self::LEAF_BITS;
            self.root = ReferenceCounter::new(Node::empty_branch());
            self.tail = ReferenceCounter::new(Vec::new());
            return;
        }

        let tail_offset = self.tail_offset();
        if count > tail_offset {
            ReferenceCounter::make_mut(&mut self.tail).truncate(count - tail_offset);
        } else {
            let cut = ((count - 1) >> Self::LEAF_BITS) << Self::LEAF_BITS;
            let new_tail = {
                let leaf = self
                    .root
                    .leaf_for(self.shift, count - 1)
                    .expect("trunk leaf missing");
                leaf[..count - cut].to_vec()
            };
            self.tail = ReferenceCounter::new(new_tail);

            if cut == 0 {
                self.root = ReferenceCounter::new(Node::empty_branch());
                self.shift = Self::LEAF_BITS;
            } else {
                ReferenceCounter::make_mut(&mut self.root).truncate_in_place(self.shift, cut);
                while self.shift > Self::LEAF_BITS && cut <= (1_usize << self.shift) {
                    let child = {
                        let Node::Branch(children) = self.root.as_ref() else {
                            unreachable!("leaf as trunk root");
                        };
                        children[0].as_ref().expect("single-child root").clone()
                    };
                    self.root = child;
                    self.shift -= Self::BITS;
                }
            }
        }
        self.length = count;
    }
}

impl<T, const N: usize, const L: usize> Default for TransientVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    #[inline]
    fn default() -> Self {
        TransientVector::new()
    }
}

impl<T: Clone, const N: usize, const L: usize> Extend<T> for TransientVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        for element in elements {
            self.push_back(element);
        }
    }
}

impl<T: fmt::Debug, const N: usize, const L: usize> fmt::Debug for TransientVector<T, N, L>
where
    Const<N>: ValidBranchingConstant,
    Const<L>: ValidBranchingConstant,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_list()
            .entries((0..self.length).map(|index| self.get(index).expect("index in range")))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
