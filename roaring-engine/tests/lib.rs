use std::collections::BTreeSet;

use proptest::prelude::*;
use roaring_engine::{Bitmap, Native, Portable};

// borrowed and adapted from https://github.com/Nemo157/roaring-rs/blob/5089f180ca7e17db25f5c58023f4460d973e747f/tests/lib.rs#L7-L37
#[test]
fn smoke1() {
    let mut bitmap = Bitmap::create();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.remove(0);
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.add(1);
    assert!(bitmap.contains(1));
    assert_eq!(bitmap.cardinality(), 1);
    assert!(!bitmap.is_empty());
    bitmap.add(u32::MAX - 2);
    assert!(bitmap.contains(u32::MAX - 2));
    assert_eq!(bitmap.cardinality(), 2);
    bitmap.add(u32::MAX);
    assert!(bitmap.contains(u32::MAX));
    assert_eq!(bitmap.cardinality(), 3);
    bitmap.add(2);
    assert!(bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 4);
    bitmap.remove(2);
    assert!(!bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 3);
    assert!(!bitmap.contains(0));
    assert!(bitmap.contains(1));
    assert!(!bitmap.contains(100));
    assert!(bitmap.contains(u32::MAX - 2));
    assert!(!bitmap.contains(u32::MAX - 1));
    assert!(bitmap.contains(u32::MAX));
    bitmap.clear();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
}

// borrowed and adapted from https://github.com/RoaringBitmap/gocroaring/blob/4a2fc02f79b1c36b904301e7d052f7f0017b6973/gocroaring_test.go#L24-L64
#[test]
fn smoke2() {
    let mut rb1 = Bitmap::create();
    rb1.add(1);
    rb1.add(2);
    rb1.add(3);
    rb1.add(4);
    rb1.add(5);
    rb1.add(100);
    rb1.add(1000);
    rb1.run_optimize();

    let mut rb2 = Bitmap::create();
    rb2.add(3);
    rb2.add(4);
    rb2.add(1000);
    rb2.run_optimize();

    let mut rb3 = Bitmap::create();

    assert_eq!(rb1.cardinality(), 7);
    assert!(rb1.contains(3));

    rb1.and_inplace(&rb2);
    rb3.add(5);
    rb3.or_inplace(&rb1);

    let rb4 = Bitmap::fast_or(&[&rb1, &rb2, &rb3]);

    assert_eq!(rb1.to_vec(), [3, 4, 1000]);
    assert_eq!(rb3.to_vec(), [3, 4, 5, 1000]);
    assert_eq!(rb4, rb3);
    assert_eq!(Bitmap::fast_or_heap(&[&rb1, &rb2, &rb3]), rb3);
    assert_eq!(Bitmap::fast_xor(&[&rb1, &rb2, &rb3]).to_vec(), [3, 4, 5, 1000]);
}

#[test]
fn empty_bitmap() {
    let bitmap = Bitmap::create();
    assert!(bitmap.is_empty());
    assert_eq!(bitmap.minimum(), None);
    assert_eq!(bitmap.maximum(), None);
    assert_eq!(bitmap.cardinality(), 0);
    assert_eq!(bitmap.select(0), None);
    assert_eq!(bitmap.rank(u32::MAX), 0);
    assert_eq!(bitmap.get_serialized_size_in_bytes::<Portable>(), 8);
    assert_eq!(bitmap.serialize::<Portable>().len(), 8);
    assert_eq!(bitmap.iter().next(), None);
    assert_eq!(Bitmap::default(), bitmap);
}

#[test]
fn range_of_501_values() {
    let mut bitmap = Bitmap::create();
    bitmap.add_range(0..=500);
    assert_eq!(bitmap.cardinality(), 501);
    assert_eq!(bitmap.maximum(), Some(500));
    assert_eq!(bitmap.minimum(), Some(0));
    assert_eq!(bitmap.rank(499), 500);
    assert!(bitmap.flip(0..501).is_empty());

    let mut flipped = bitmap.clone();
    flipped.flip_inplace(0..501);
    assert!(flipped.is_empty());
    flipped.flip_inplace(0..501);
    assert_eq!(flipped, bitmap);
}

#[test]
fn jaccard_of_overlapping_triples() {
    let a = Bitmap::of(&[1, 2, 3]);
    let b = Bitmap::of(&[3, 4, 5]);
    assert_eq!(a.jaccard_index(&b), 0.2);
}

#[test]
fn content_hash_reference_value() {
    let bitmap = Bitmap::from_range_with_step(0..100, 2);
    assert_eq!(bitmap.cardinality(), 50);
    assert_eq!(bitmap.content_hash(), 3801178162);
    assert_eq!(Bitmap::create().content_hash(), 0);
}

#[test]
fn and_of_short_runs_with_dense_bitset() {
    let mut runs = Bitmap::from_range(0..3);
    runs.add_range(5..8);
    runs.run_optimize();
    let evens = Bitmap::from_range_with_step(0..65536, 2);

    assert_eq!(runs.and(&evens).to_vec(), [0, 2, 6]);
    assert_eq!(evens.and(&runs).to_vec(), [0, 2, 6]);
    assert_eq!(runs.and_cardinality(&evens), 3);

    let mut result = runs.clone();
    result &= &evens;
    assert_eq!(result.to_vec(), [0, 2, 6]);

    let mut a = Bitmap::of(&[27606, 27584]);
    a.add_range(0..=5);
    a.run_optimize();
    let b = Bitmap::from_range_with_step(27584..65536, 2);
    assert_eq!(a.and(&b).to_vec(), [27584, 27606]);
}

#[test]
fn self_operations() {
    let mut bitmap = Bitmap::from_range(10..100_000);
    bitmap.add_many(&[3, 1 << 30]);
    assert_eq!(&bitmap | &bitmap, bitmap);
    assert_eq!(&bitmap & &bitmap, bitmap);
    assert!((&bitmap ^ &bitmap).is_empty());
    assert!((&bitmap - &bitmap).is_empty());

    let copy = bitmap.clone();
    bitmap.and_inplace(&copy);
    assert_eq!(bitmap, copy);
    bitmap.xor_inplace(&copy);
    assert!(bitmap.is_empty());
}

#[test]
fn full_value_space() {
    let mut bitmap = Bitmap::from_range(..);
    assert_eq!(bitmap.cardinality(), 1 << 32);
    assert_eq!(bitmap.maximum(), Some(u32::MAX));
    assert_eq!(bitmap.select(u32::MAX), Some(u32::MAX));
    assert!(bitmap.contains_range(..));
    assert_eq!(bitmap.range_cardinality(..), 1 << 32);
    let statistics = bitmap.statistics();
    assert_eq!(statistics.n_run_containers, 1 << 16);

    let bytes = bitmap.serialize::<Portable>();
    assert_eq!(Bitmap::deserialize::<Portable>(&bytes), bitmap);
    assert_eq!(bitmap.serialize::<Native>()[0], 2);

    bitmap.remove_range(1..u32::MAX);
    assert_eq!(bitmap.to_vec(), [0, u32::MAX]);
}

#[test]
fn collect_and_extend() {
    let values = [5, 3, 1 << 20, 3];
    let bitmap: Bitmap = values.iter().collect();
    assert_eq!(bitmap.to_vec(), [3, 5, 1 << 20]);

    let mut extended = Bitmap::create();
    extended.extend(values);
    extended.extend(&[7, 8]);
    assert_eq!(extended.to_vec(), [3, 5, 7, 8, 1 << 20]);
    assert_eq!((&extended).into_iter().count(), 5);
}

#[test]
fn pop_and_retain() {
    let mut bitmap = Bitmap::from_range(0..10);
    assert_eq!(bitmap.pop_first(), Some(0));
    assert_eq!(bitmap.pop_last(), Some(9));
    bitmap.retain(|v| v % 2 == 0);
    assert_eq!(bitmap.to_vec(), [2, 4, 6, 8]);
    bitmap.remove_many(&[2, 4, 6, 8]);
    assert!(bitmap.is_empty());
    assert_eq!(bitmap.pop_first(), None);
}

#[test]
#[should_panic(expected = "step must be at least 1")]
fn zero_step_panics() {
    Bitmap::from_range_with_step(0..10, 0);
}

/// Low values of one container: sparse, a contiguous range, or a dense set
fn container_values() -> impl Strategy<Value = Vec<u16>> {
    prop_oneof![
        prop::collection::vec(any::<u16>(), 0..64),
        (any::<u16>(), 0u16..20_000)
            .prop_map(|(start, len)| (start..start.saturating_add(len)).collect()),
        (1u32..4, any::<u16>()).prop_map(|(step, offset)| {
            (0..=u16::MAX)
                .filter(|v| (u32::from(*v) + u32::from(offset)) % step == 0)
                .collect()
        }),
    ]
}

fn bitmap_values() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec((0u32..6, container_values()), 0..5).prop_map(|containers| {
        containers
            .into_iter()
            .flat_map(|(key, lows)| lows.into_iter().map(move |low| key << 16 | u32::from(low)))
            .collect()
    })
}

fn build(values: &[u32], optimize: bool) -> (Bitmap, BTreeSet<u32>) {
    let mut bitmap = Bitmap::of(values);
    if optimize {
        bitmap.run_optimize();
    }
    (bitmap, values.iter().copied().collect())
}

fn to_vec(set: &BTreeSet<u32>) -> Vec<u32> {
    set.iter().copied().collect()
}

proptest! {
    #[test]
    fn bitmap_cardinality_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let original = Bitmap::of(&indices);
        let mut a = indices;
        a.sort_unstable();
        a.dedup();
        prop_assert_eq!(a.len(), original.cardinality() as usize);
        prop_assert_eq!(a, original.to_vec());
    }

    #[test]
    fn algebra_matches_btreeset(
        a in bitmap_values(),
        b in bitmap_values(),
        optimize_a in any::<bool>(),
        optimize_b in any::<bool>(),
    ) {
        let (bitmap_a, set_a) = build(&a, optimize_a);
        let (bitmap_b, set_b) = build(&b, optimize_b);

        let and = to_vec(&set_a.intersection(&set_b).copied().collect());
        let or = to_vec(&set_a.union(&set_b).copied().collect());
        let xor = to_vec(&set_a.symmetric_difference(&set_b).copied().collect());
        let andnot = to_vec(&set_a.difference(&set_b).copied().collect());

        prop_assert_eq!(bitmap_a.and(&bitmap_b).to_vec(), and.clone());
        prop_assert_eq!(bitmap_a.or(&bitmap_b).to_vec(), or.clone());
        prop_assert_eq!(bitmap_a.xor(&bitmap_b).to_vec(), xor.clone());
        prop_assert_eq!(bitmap_a.andnot(&bitmap_b).to_vec(), andnot.clone());

        let mut inplace = bitmap_a.clone();
        inplace &= &bitmap_b;
        prop_assert_eq!(inplace.to_vec(), and.clone());
        let mut inplace = bitmap_a.clone();
        inplace |= &bitmap_b;
        prop_assert_eq!(inplace.to_vec(), or.clone());
        let mut inplace = bitmap_a.clone();
        inplace ^= &bitmap_b;
        prop_assert_eq!(inplace.to_vec(), xor.clone());
        let mut inplace = bitmap_a.clone();
        inplace -= &bitmap_b;
        prop_assert_eq!(inplace.to_vec(), andnot.clone());

        prop_assert_eq!(bitmap_a.and_cardinality(&bitmap_b), and.len() as u64);
        prop_assert_eq!(bitmap_a.or_cardinality(&bitmap_b), or.len() as u64);
        prop_assert_eq!(bitmap_a.xor_cardinality(&bitmap_b), xor.len() as u64);
        prop_assert_eq!(bitmap_a.andnot_cardinality(&bitmap_b), andnot.len() as u64);

        prop_assert_eq!(bitmap_a.intersect(&bitmap_b), !and.is_empty());
        prop_assert_eq!(bitmap_a.is_disjoint(&bitmap_b), and.is_empty());
        prop_assert_eq!(bitmap_a.is_subset(&bitmap_b), set_a.is_subset(&set_b));

        prop_assert_eq!(bitmap_a.lazy_or(&bitmap_b, true).to_vec(), or.clone());
        prop_assert_eq!(bitmap_a.lazy_xor(&bitmap_b).to_vec(), xor);
        prop_assert_eq!(Bitmap::fast_or_heap(&[&bitmap_a, &bitmap_b]).to_vec(), or);
    }

    #[test]
    fn serialization_roundtrip(values in bitmap_values(), optimize in any::<bool>()) {
        let (bitmap, _) = build(&values, optimize);

        let portable = bitmap.serialize::<Portable>();
        prop_assert_eq!(portable.len(), bitmap.get_serialized_size_in_bytes::<Portable>());
        prop_assert_eq!(Bitmap::deserialize_checked::<Portable>(&portable), Ok(bitmap.clone()));

        let native = bitmap.serialize::<Native>();
        prop_assert_eq!(native.len(), bitmap.get_serialized_size_in_bytes::<Native>());
        prop_assert_eq!(Bitmap::deserialize_checked::<Native>(&native), Ok(bitmap.clone()));
    }

    #[test]
    fn rank_and_select_are_inverse(values in bitmap_values(), optimize in any::<bool>()) {
        let (bitmap, set) = build(&values, optimize);
        for (index, &value) in set.iter().enumerate().step_by(97) {
            let rank = bitmap.rank(value);
            prop_assert_eq!(rank, index as u64 + 1);
            prop_assert_eq!(bitmap.select(rank as u32 - 1), Some(value));
        }
        if let Some(min) = bitmap.minimum() {
            if min > 0 {
                prop_assert_eq!(bitmap.rank(min - 1), 0);
            }
        }
        prop_assert_eq!(bitmap.select(bitmap.cardinality() as u32), None);
    }

    #[test]
    fn compaction_preserves_contents(values in bitmap_values()) {
        let (mut bitmap, set) = build(&values, false);
        let expected = to_vec(&set);
        let hash = bitmap.content_hash();

        bitmap.run_optimize();
        prop_assert_eq!(bitmap.to_vec(), expected.clone());
        prop_assert_eq!(bitmap.cardinality(), expected.len() as u64);
        prop_assert_eq!(bitmap.content_hash(), hash);

        bitmap.remove_run_compression();
        prop_assert_eq!(bitmap.statistics().n_run_containers, 0);
        prop_assert_eq!(bitmap.to_vec(), expected);
        bitmap.shrink_to_fit();
        prop_assert_eq!(bitmap.content_hash(), hash);
    }

    #[test]
    fn range_operations_match_btreeset(
        values in bitmap_values(),
        start in 0u32..(6 << 16),
        len in 0u32..200_000,
    ) {
        let (bitmap, set) = build(&values, true);
        let end = start + len;

        let inside = set.range(start..end).count() as u64;
        prop_assert_eq!(bitmap.range_cardinality(start..end), inside);
        prop_assert_eq!(bitmap.contains_range(start..end), inside == u64::from(len));

        let flipped: BTreeSet<u32> = set
            .symmetric_difference(&(start..end).collect())
            .copied()
            .collect();
        prop_assert_eq!(bitmap.flip(start..end).to_vec(), to_vec(&flipped));

        let mut removed = bitmap.clone();
        removed.remove_range(start..end);
        prop_assert_eq!(removed.to_vec(), set.iter().copied().filter(|v| !(start..end).contains(v)).collect::<Vec<_>>());

        let mut added = bitmap.clone();
        added.add_range(start..end);
        prop_assert_eq!(added.cardinality(), set.len() as u64 + u64::from(len) - inside);
    }

    #[test]
    fn many_way_union(inputs in prop::collection::vec(bitmap_values(), 0..6)) {
        let bitmaps: Vec<Bitmap> = inputs.iter().map(|values| Bitmap::of(values)).collect();
        let refs: Vec<&Bitmap> = bitmaps.iter().collect();
        let folded_or = bitmaps.iter().fold(Bitmap::create(), |acc, b| acc | b);
        let folded_xor = bitmaps.iter().fold(Bitmap::create(), |acc, b| acc ^ b);

        prop_assert_eq!(Bitmap::fast_or(&refs), folded_or.clone());
        prop_assert_eq!(Bitmap::fast_or_heap(&refs), folded_or);
        prop_assert_eq!(Bitmap::fast_xor(&refs), folded_xor);
    }
}
