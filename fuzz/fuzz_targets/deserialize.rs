#![no_main]

use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use roaring_engine::{Bitmap, Deserializer, Native, Portable, Serializer};

fn check_bitmap<F: Deserializer + Serializer>(input: &[u8]) {
    let Ok(mut bitmap) = Bitmap::deserialize_checked::<F>(input) else {
        assert_eq!(F::try_deserialize(input), None);
        return;
    };

    let size = F::find_serialized_size(input).expect("decoded input has a size");
    assert!(size <= input.len());

    let unsafe_version = unsafe { F::try_deserialize_unchecked(input) };
    assert_eq!(
        bitmap,
        unsafe_version,
        "Unsafe doesn't match safe {}",
        std::any::type_name::<F>()
    );

    let reencoded = bitmap.serialize::<F>();
    assert_eq!(Bitmap::deserialize_checked::<F>(&reencoded).as_ref(), Ok(&bitmap));

    let start_cardinality = bitmap.cardinality();
    let mut new_cardinality = start_cardinality;
    for i in 100..1000 {
        if !bitmap.contains(i) {
            bitmap.add(i);
            new_cardinality += 1;
        }
    }
    assert_eq!(
        new_cardinality,
        bitmap.cardinality(),
        "Cardinality mismatch in {}",
        std::any::type_name::<F>()
    );
}

#[derive(Arbitrary, Debug)]
enum Format {
    Portable,
    Native,
}

fuzz_target!(|input: (Format, &[u8])| {
    let (format, input) = input;
    match format {
        Format::Portable => check_bitmap::<Portable>(input),
        Format::Native => check_bitmap::<Native>(input),
    }
});
