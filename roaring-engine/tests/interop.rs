//! The portable format is shared with every other Roaring implementation,
//! checked here against the `roaring` crate.

use proptest::prelude::*;
use roaring::RoaringBitmap;
use roaring_engine::{Bitmap, Portable};

fn from_roaring(bitmap: &RoaringBitmap) -> Bitmap {
    let mut bytes = Vec::with_capacity(bitmap.serialized_size());
    bitmap.serialize_into(&mut bytes).unwrap();
    Bitmap::deserialize_checked::<Portable>(&bytes).unwrap()
}

fn to_roaring(bitmap: &Bitmap) -> RoaringBitmap {
    RoaringBitmap::deserialize_from(&bitmap.serialize::<Portable>()[..]).unwrap()
}

#[test]
fn reads_roaring_output() {
    let mut expected = RoaringBitmap::new();
    expected.insert_range(10..100_000);
    expected.extend([1 << 20, 1 << 30, u32::MAX]);
    expected.extend((200_000..300_000).step_by(7));

    let bitmap = from_roaring(&expected);
    assert_eq!(bitmap.cardinality(), expected.len());
    assert!(bitmap.iter().eq(expected.iter()));
}

#[test]
fn written_bytes_are_readable_by_roaring() {
    let mut bitmap = Bitmap::from_range(10..100_000);
    bitmap.add_many(&[1 << 20, 1 << 30, u32::MAX]);
    bitmap.run_optimize();

    let decoded = to_roaring(&bitmap);
    assert_eq!(decoded.len(), bitmap.cardinality());
    assert!(decoded.iter().eq(bitmap.iter()));
}

#[test]
fn array_and_bitset_containers_match_byte_for_byte() {
    let values: Vec<u32> = (0..100_000).step_by(3).chain([1 << 24, 1 << 25]).collect();
    let bitmap = Bitmap::of(&values);
    let expected: RoaringBitmap = values.iter().copied().collect();

    let mut bytes = Vec::new();
    expected.serialize_into(&mut bytes).unwrap();
    assert_eq!(bitmap.serialize::<Portable>(), bytes);
    assert_eq!(bitmap.get_serialized_size_in_bytes::<Portable>(), expected.serialized_size());
}

proptest! {
    #[test]
    fn portable_interop(values in prop::collection::vec(0u32..(1 << 22), 0..10_000)) {
        let expected: RoaringBitmap = values.iter().copied().collect();
        let bitmap = Bitmap::of(&values);

        let mut bytes = Vec::new();
        expected.serialize_into(&mut bytes).unwrap();
        prop_assert_eq!(bitmap.serialize::<Portable>(), bytes.clone());
        prop_assert_eq!(from_roaring(&expected), bitmap.clone());
        prop_assert_eq!(to_roaring(&bitmap), expected);
    }
}
