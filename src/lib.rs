//! # radixvec
//!
//! A persistent (immutable) vector backed by a bit-partitioned radix-balanced
//! trie, together with a transient (ephemerally mutable) companion for
//! batched construction.
//!
//! ## Overview
//!
//! [`PersistentVector`] stores its elements in contiguous leaf chunks hanging
//! off a fixed-fanout trie, with the most recent chunk buffered in a separate
//! *tail*. This layout provides:
//!
//! - O(log N) random access (effectively O(1) for practical sizes)
//! - O(log N) positional update, amortized O(1) append
//! - O(1) `len` / `is_empty`
//! - Structural sharing: every operation returns a new vector that shares all
//!   untouched subtrees with its predecessor
//!
//! [`TransientVector`] is the same structure made ephemerally mutable: nodes
//! the transient provably owns are mutated in place, nodes still shared with
//! a persistent predecessor are cloned on first touch. Converting between the
//! two views is O(1) in either direction.
//!
//! ## Branching configuration
//!
//! Both types take const parameters `N` (branch fanout) and `L` (leaf
//! capacity), each a power of two enforced by [`ValidBranchingConstant`].
//! The defaults, `N = L = 32`, keep the trie at most seven levels deep for
//! any practical length.
//!
//! ## Feature Flags
//!
//! - `arc`: use atomic reference counting (`Arc`) for structural sharing,
//!   making persistent values shareable across threads.
//!
//! ## Example
//!
//! ```rust
//! use radixvec::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..100).collect();
//! let updated = vector.set(50, 999).unwrap();
//!
//! assert_eq!(vector.get(50), Some(&50));   // Original unchanged
//! assert_eq!(updated.get(50), Some(&999)); // New version
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

// =============================================================================
// Branching Constants
// =============================================================================

/// Marker trait restricting the `N` and `L` parameters of
/// [`PersistentVector`] to reasonably-sized powers of two.
///
/// Powers of two let every index computation reduce to shifts and masks.
pub trait ValidBranchingConstant {}

/// Carrier type lifting a const parameter into the trait system, so that
/// `Const<N>: ValidBranchingConstant` can constrain `N`.
pub struct Const<const N: usize> {}

impl ValidBranchingConstant for Const<2> {}
impl ValidBranchingConstant for Const<4> {}
impl ValidBranchingConstant for Const<8> {}
impl ValidBranchingConstant for Const<16> {}
impl ValidBranchingConstant for Const<32> {}
impl ValidBranchingConstant for Const<64> {}

mod iter;
mod node;
mod transient;
mod vector;

pub use iter::ChunkIterator;
pub use iter::PersistentVectorIntoIterator;
pub use iter::PersistentVectorIterator;
pub use transient::TransientVector;
pub use vector::PersistentVector;

// =============================================================================
// Tests
// =============================================================================
