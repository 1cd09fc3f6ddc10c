#![no_main]

use crate::arbitrary_ops::*;
use libfuzzer_sys::arbitrary;
use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use roaring_engine::{Bitmap, Native, Portable};
use std::collections::BTreeSet;

mod arbitrary_ops;

fuzz_target!(|input: FuzzInput| {
    let mut lhs = Bitmap::create();
    let mut rhs = Bitmap::create();
    let mut lhs_model = BTreeSet::new();
    let mut rhs_model = BTreeSet::new();

    for op in &input.lhs_ops {
        op.apply(&mut lhs, &mut lhs_model);
    }
    for op in &input.rhs_ops {
        op.apply(&mut rhs, &mut rhs_model);
    }

    for op in &input.read_ops {
        op.check(&lhs, &lhs_model);
        op.check(&rhs, &rhs_model);
    }

    for op in &input.comp_ops {
        op.apply(&mut lhs, &rhs);
    }

    let mut buffer = Vec::new();
    check_serialized(&lhs, &mut buffer);
    check_serialized(&rhs, &mut buffer);
});

fn check_serialized(bitmap: &Bitmap, buffer: &mut Vec<u8>) {
    buffer.clear();

    let portable = bitmap.serialize_into::<Portable>(buffer);
    assert_eq!(portable.len(), bitmap.get_serialized_size_in_bytes::<Portable>());
    assert_eq!(Bitmap::deserialize_checked::<Portable>(portable).as_ref(), Ok(bitmap));

    let native = bitmap.serialize::<Native>();
    assert_eq!(native.len(), native_size(bitmap));
    assert_eq!(Bitmap::deserialize_checked::<Native>(&native).as_ref(), Ok(bitmap));
}

// One tag byte, then whichever of the two layouts is smaller
fn native_size(bitmap: &Bitmap) -> usize {
    1 + bitmap
        .get_serialized_size_in_bytes::<Portable>()
        .min(4 + 4 * bitmap.cardinality() as usize)
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    lhs_ops: Vec<MutableBitmapOperation>,
    rhs_ops: Vec<MutableBitmapOperation>,
    comp_ops: Vec<BitmapCompOperation>,
    read_ops: Vec<ReadBitmapOp>,
}
