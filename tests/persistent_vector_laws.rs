//! Property-based tests for `PersistentVector` laws.
//!
//! This module verifies the algebraic laws and invariants of the persistent
//! vector using proptest: read-after-write laws, persistence, structural
//! sharing, transient equivalence, and standard-trait consistency.

use proptest::prelude::*;
use radixvec::{PersistentVector, TransientVector};

// =============================================================================
// Read-after-write Laws
// =============================================================================

proptest! {
    /// Set law: the replaced element is observable, every other index is not
    /// affected.
    #[test]
    fn prop_set_then_get(
        elements in prop::collection::vec(any::<i32>(), 1..300),
        position in any::<prop::sample::Index>(),
        new_value: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let index = position.index(vector.len());

        let updated = vector.set(index, new_value).expect("index in range");
        prop_assert_eq!(updated.get(index), Some(&new_value));
        for other in 0..vector.len() {
            if other != index {
                prop_assert_eq!(updated.get(other), vector.get(other));
            }
        }
    }

    /// Push law: `push_back` grows the length by one and places the element
    /// at the old length.
    #[test]
    fn prop_push_back_appends(
        elements in prop::collection::vec(any::<i32>(), 0..300),
        new_value: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let extended = vector.push_back(new_value);

        prop_assert_eq!(extended.len(), vector.len() + 1);
        prop_assert_eq!(extended.get(vector.len()), Some(&new_value));
        for index in 0..vector.len() {
            prop_assert_eq!(extended.get(index), vector.get(index));
        }
    }

    /// Take law: the result has `min(count, len)` elements and agrees with
    /// the source on every surviving index.
    #[test]
    fn prop_take_is_a_prefix(
        elements in prop::collection::vec(any::<i32>(), 0..300),
        count in 0_usize..400
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let truncated = vector.take(count);

        prop_assert_eq!(truncated.len(), count.min(vector.len()));
        for index in 0..truncated.len() {
            prop_assert_eq!(truncated.get(index), vector.get(index));
        }
    }

    /// Update computes from the current element.
    #[test]
    fn prop_update_uses_current_value(
        elements in prop::collection::vec(-1000_i32..1000, 1..200),
        position in any::<prop::sample::Index>()
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let index = position.index(vector.len());

        let updated = vector.update(index, |value| value + 1).expect("index in range");
        prop_assert_eq!(*updated.get(index).expect("index in range"), elements[index] + 1);
    }
}

// =============================================================================
// Persistence Laws
// =============================================================================

proptest! {
    /// No persistent operation modifies its receiver.
    #[test]
    fn prop_operations_preserve_original(
        elements in prop::collection::vec(any::<i32>(), 1..200),
        position in any::<prop::sample::Index>(),
        count in 0_usize..250,
        new_value: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let index = position.index(vector.len());

        let _pushed = vector.push_back(new_value);
        let _set = vector.set(index, new_value);
        let _taken = vector.take(count);
        let _popped = vector.pop_back();

        prop_assert_eq!(vector.len(), elements.len());
        for (other, element) in elements.iter().enumerate() {
            prop_assert_eq!(vector.get(other), Some(element));
        }
    }

    /// Multiple divergent versions can coexist.
    #[test]
    fn prop_versions_are_independent(
        elements in prop::collection::vec(any::<i32>(), 5..100)
    ) {
        let base: PersistentVector<i32> = elements.iter().copied().collect();
        let version1 = base.push_back(1000);
        let version2 = base.push_back(2000);
        let version3 = base.take(3);

        prop_assert_eq!(base.len(), elements.len());
        prop_assert_eq!(version1.get(elements.len()), Some(&1000));
        prop_assert_eq!(version2.get(elements.len()), Some(&2000));
        prop_assert_eq!(version3.len(), 3);
    }
}

// =============================================================================
// Structural Sharing Laws
// =============================================================================

proptest! {
    /// Replacing an element leaves every other chunk physically shared
    /// between the old and new version.
    #[test]
    fn prop_set_shares_untouched_chunks(
        size in 1_usize..300,
        position in any::<prop::sample::Index>(),
        other_position in any::<prop::sample::Index>()
    ) {
        let vector: PersistentVector<i32> = (0..size as i32).collect();
        let index = position.index(size);
        let other = other_position.index(size);
        prop_assume!(index / 32 != other / 32);

        let updated = vector.set(index, -1).expect("index in range");
        prop_assert!(std::ptr::eq(
            vector.get(other).expect("index in range"),
            updated.get(other).expect("index in range")
        ));
    }
}

// =============================================================================
// Transient Equivalence Laws
// =============================================================================

/// A positional operation applied both to a persistent vector and to a
/// transient, for equivalence checking.
#[derive(Clone, Debug)]
enum Operation {
    PushBack(i32),
    Set(prop::sample::Index, i32),
    Update(prop::sample::Index),
    Take(usize),
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        any::<i32>().prop_map(Operation::PushBack),
        (any::<prop::sample::Index>(), any::<i32>())
            .prop_map(|(position, value)| Operation::Set(position, value)),
        any::<prop::sample::Index>().prop_map(Operation::Update),
        (0_usize..300).prop_map(Operation::Take),
    ]
}

fn apply_persistent(vector: PersistentVector<i32>, operation: &Operation) -> PersistentVector<i32> {
    match operation {
        Operation::PushBack(value) => vector.push_back(*value),
        Operation::Set(position, value) => {
            if vector.is_empty() {
                vector
            } else {
                let index = position.index(vector.len());
                vector.set(index, *value).expect("index in range")
            }
        }
        Operation::Update(position) => {
            if vector.is_empty() {
                vector
            } else {
                let index = position.index(vector.len());
                vector
                    .update(index, |value| value.wrapping_mul(3))
                    .expect("index in range")
            }
        }
        Operation::Take(count) => vector.take(*count),
    }
}

fn apply_transient(transient: &mut TransientVector<i32>, operation: &Operation) {
    match operation {
        Operation::PushBack(value) => transient.push_back(*value),
        Operation::Set(position, value) => {
            if !transient.is_empty() {
                let index = position.index(transient.len());
                transient.set(index, *value);
            }
        }
        Operation::Update(position) => {
            if !transient.is_empty() {
                let index = position.index(transient.len());
                transient.update(index, |value| value.wrapping_mul(3));
            }
        }
        Operation::Take(count) => transient.take(*count),
    }
}

fn apply_model(model: &mut Vec<i32>, operation: &Operation) {
    match operation {
        Operation::PushBack(value) => model.push(*value),
        Operation::Set(position, value) => {
            if !model.is_empty() {
                let index = position.index(model.len());
                model[index] = *value;
            }
        }
        Operation::Update(position) => {
            if !model.is_empty() {
                let index = position.index(model.len());
                model[index] = model[index].wrapping_mul(3);
            }
        }
        Operation::Take(count) => model.truncate(*count),
    }
}

proptest! {
    /// A zero-mutation round trip through the transient form is an identity.
    #[test]
    fn prop_transient_roundtrip_is_identity(
        elements in prop::collection::vec(any::<i32>(), 0..500)
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let roundtripped = vector.clone().transient().persistent();
        prop_assert_eq!(roundtripped, vector);
    }

    /// Applying a sequence of operations through persistent ops or through a
    /// transient (with final conversion) yields the same final sequence, and
    /// both agree with a plain `Vec` model.
    #[test]
    fn prop_op_sequence_equivalence(
        initial in prop::collection::vec(any::<i32>(), 0..100),
        operations in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        let mut persistent: PersistentVector<i32> = initial.iter().copied().collect();
        let mut transient = persistent.clone().transient();
        let mut model = initial.clone();

        for operation in &operations {
            persistent = apply_persistent(persistent, operation);
            apply_transient(&mut transient, operation);
            apply_model(&mut model, operation);
        }

        let via_transient = transient.persistent();
        prop_assert_eq!(&persistent, &via_transient);
        prop_assert_eq!(persistent.len(), model.len());
        for (index, element) in model.iter().enumerate() {
            prop_assert_eq!(persistent.get(index), Some(element));
        }
    }

    /// Batch push through a transient equals sequential persistent pushes.
    #[test]
    fn prop_transient_batch_push_equals_persistent(
        initial in prop::collection::vec(any::<i32>(), 0..100),
        additions in prop::collection::vec(any::<i32>(), 0..200)
    ) {
        let vector: PersistentVector<i32> = initial.iter().copied().collect();

        let mut transient = vector.clone().transient();
        for &element in &additions {
            transient.push_back(element);
        }
        let via_transient = transient.persistent();

        let via_persistent = vector.push_back_many(additions.iter().copied());
        prop_assert_eq!(via_transient, via_persistent);
    }
}

// =============================================================================
// Iterator Laws
// =============================================================================

proptest! {
    /// Iteration returns every element in order.
    #[test]
    fn prop_iter_preserves_order(
        elements in prop::collection::vec(any::<i32>(), 0..1000)
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let collected: Vec<i32> = vector.iter().copied().collect();
        prop_assert_eq!(collected, elements);
    }

    /// Chunk iteration covers the same elements as element iteration.
    #[test]
    fn prop_chunks_cover_all_elements(
        elements in prop::collection::vec(any::<i32>(), 0..1000)
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let mut collected: Vec<i32> = Vec::new();
        vector.for_each_chunk(|chunk| collected.extend_from_slice(chunk));
        prop_assert_eq!(collected, elements);
    }

    /// size_hint stays exact while consuming the iterator.
    #[test]
    fn prop_iterator_size_hint_accuracy(
        elements in prop::collection::vec(any::<i32>(), 0..200),
        consume_count in 0_usize..201
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let mut iterator = vector.iter();

        let to_consume = consume_count.min(elements.len());
        for _ in 0..to_consume {
            iterator.next();
        }

        let expected_remaining = elements.len() - to_consume;
        prop_assert_eq!(iterator.size_hint(), (expected_remaining, Some(expected_remaining)));
    }

    /// Iterator behaviour at trie boundaries.
    #[test]
    fn prop_iterator_tree_boundaries(
        size in prop::sample::select(vec![
            31_usize, 32, 33, 63, 64, 65, 1023, 1024, 1025, 1056, 1057
        ])
    ) {
        let vector: PersistentVector<i32> = (0..size as i32).collect();
        let collected: Vec<i32> = vector.iter().copied().collect();
        let expected: Vec<i32> = (0..size as i32).collect();
        prop_assert_eq!(collected, expected);
    }
}

// =============================================================================
// Pop Laws
// =============================================================================

proptest! {
    /// `push_back` and `pop_back` are inverse operations.
    #[test]
    fn prop_push_pop_back_inverse(
        elements in prop::collection::vec(any::<i32>(), 0..200),
        new_element: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let (remaining, popped) = vector.push_back(new_element).pop_back().expect("non-empty");

        prop_assert_eq!(popped, new_element);
        prop_assert_eq!(remaining, vector);
    }
}

// =============================================================================
// Hash and Ord Laws
// =============================================================================

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn calculate_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Generates a small `PersistentVector<i32>` for comparison laws.
fn small_vector() -> impl Strategy<Value = PersistentVector<i32>> {
    prop::collection::vec(any::<i32>(), 0..20).prop_map(|elements| elements.into_iter().collect())
}

proptest! {
    /// Equal vectors hash identically.
    #[test]
    fn prop_hash_eq_consistency(elements in prop::collection::vec(any::<i32>(), 0..100)) {
        let vector1: PersistentVector<i32> = elements.iter().copied().collect();
        let vector2: PersistentVector<i32> = elements.iter().copied().collect();

        prop_assert_eq!(&vector1, &vector2);
        prop_assert_eq!(calculate_hash(&vector1), calculate_hash(&vector2));
    }

    /// Appending an element changes the hash.
    #[test]
    fn prop_hash_length_sensitive(
        elements in prop::collection::vec(any::<i32>(), 1..50),
        extra: i32
    ) {
        let vector1: PersistentVector<i32> = elements.iter().copied().collect();
        let vector2 = vector1.push_back(extra);
        prop_assert_ne!(calculate_hash(&vector1), calculate_hash(&vector2));
    }

    #[test]
    fn prop_ord_consistency_with_eq(vector1 in small_vector(), vector2 in small_vector()) {
        prop_assert_eq!(
            vector1.cmp(&vector2) == std::cmp::Ordering::Equal,
            vector1 == vector2
        );
    }

    #[test]
    fn prop_ord_consistency_with_partial_ord(vector1 in small_vector(), vector2 in small_vector()) {
        prop_assert_eq!(vector1.partial_cmp(&vector2), Some(vector1.cmp(&vector2)));
    }
}

// =============================================================================
// Concat Laws
// =============================================================================

proptest! {
    /// concat preserves length and order of both inputs.
    #[test]
    fn prop_concat_preserves_order(
        left_elements in prop::collection::vec(any::<i32>(), 0..100),
        right_elements in prop::collection::vec(any::<i32>(), 0..100)
    ) {
        let left: PersistentVector<i32> = left_elements.iter().copied().collect();
        let right: PersistentVector<i32> = right_elements.iter().copied().collect();
        let combined = left.concat(&right);

        let mut expected = left_elements.clone();
        expected.extend(right_elements.iter().copied());

        prop_assert_eq!(combined.len(), expected.len());
        let collected: Vec<i32> = combined.iter().copied().collect();
        prop_assert_eq!(collected, expected);
    }

    /// concat is associative.
    #[test]
    fn prop_concat_associativity(
        elements_a in prop::collection::vec(any::<i32>(), 0..30),
        elements_b in prop::collection::vec(any::<i32>(), 0..30),
        elements_c in prop::collection::vec(any::<i32>(), 0..30)
    ) {
        let vector_a: PersistentVector<i32> = elements_a.into_iter().collect();
        let vector_b: PersistentVector<i32> = elements_b.into_iter().collect();
        let vector_c: PersistentVector<i32> = elements_c.into_iter().collect();

        let grouped_left = vector_a.concat(&vector_b).concat(&vector_c);
        let grouped_right = vector_a.concat(&vector_b.concat(&vector_c));
        prop_assert_eq!(grouped_left, grouped_right);
    }
}

// =============================================================================
// Owned Variant Laws
// =============================================================================

proptest! {
    /// The owned in-place variants are observationally identical to the
    /// copying operations.
    #[test]
    fn prop_owned_variants_observationally_identical(
        elements in prop::collection::vec(any::<i32>(), 1..200),
        position in any::<prop::sample::Index>(),
        count in 0_usize..250,
        new_value: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let index = position.index(vector.len());

        prop_assert_eq!(
            vector.clone().push_back_owned(new_value),
            vector.push_back(new_value)
        );
        prop_assert_eq!(
            vector.clone().set_owned(index, new_value),
            vector.set(index, new_value)
        );
        prop_assert_eq!(
            vector.clone().update_owned(index, |value| value.wrapping_add(1)),
            vector.update(index, |value| value.wrapping_add(1))
        );
        prop_assert_eq!(vector.clone().take_owned(count), vector.take(count));
    }
}
