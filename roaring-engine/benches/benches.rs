use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use roaring_engine::{Bitmap, Native, Portable};

/// One bitmap per container kind, plus a mix of all three
fn samples() -> Vec<(&'static str, Bitmap)> {
    let sparse = Bitmap::from_range_with_step(0..10_000_000, 1_000);
    let dense = Bitmap::from_range_with_step(0..1_000_000, 3);
    let mut runs = Bitmap::from_range(0..1_000_000);
    runs.remove_many(&[10, 70_000, 500_000]);
    runs.run_optimize();
    let mixed = sparse.or(&dense).or(&Bitmap::from_range(2_000_000..3_000_000));
    vec![
        ("sparse", sparse),
        ("dense", dense),
        ("runs", runs),
        ("mixed", mixed),
    ]
}

fn create(c: &mut Criterion) {
    c.bench_function("create", |b| b.iter(Bitmap::create));

    c.bench_function("create_with_capacity", |b| {
        b.iter(|| Bitmap::create_with_capacity(10_000))
    });
}

fn add(c: &mut Criterion) {
    c.bench_function("add", |b| {
        let mut bitmap = Bitmap::create();

        b.iter(|| bitmap.add(black_box(10_000)));
    });

    c.bench_function("add_many", |b| {
        let values: Vec<u32> = (0..100_000).map(|i| i * 37).collect();
        b.iter_batched(
            Bitmap::create,
            |mut bitmap| bitmap.add_many(black_box(&values)),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("add_range", |b| {
        b.iter_batched(
            Bitmap::create,
            |mut bitmap| bitmap.add_range(black_box(1_000..3_000_000)),
            BatchSize::SmallInput,
        );
    });
}

fn remove(c: &mut Criterion) {
    c.bench_function("remove", |b| {
        let mut bitmap = Bitmap::create();

        b.iter(|| bitmap.remove(black_box(10_000)));
    });
}

fn queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    for (name, bitmap) in samples() {
        group.bench_function(name, |b| b.iter(|| bitmap.contains(black_box(500_001))));
    }
    group.finish();

    let mut group = c.benchmark_group("rank");
    for (name, bitmap) in samples() {
        group.bench_function(name, |b| b.iter(|| bitmap.rank(black_box(500_001))));
    }
    group.finish();

    let mut group = c.benchmark_group("select");
    for (name, bitmap) in samples() {
        let middle = (bitmap.cardinality() / 2) as u32;
        group.bench_function(name, |b| b.iter(|| bitmap.select(black_box(middle))));
    }
    group.finish();

    let mut group = c.benchmark_group("cardinality");
    for (name, bitmap) in samples() {
        group.bench_function(name, |b| b.iter(|| bitmap.cardinality()));
    }
    group.finish();
}

fn binops(c: &mut Criterion) {
    let samples = samples();
    let (_, bitmap1) = &samples[1];
    let (_, bitmap2) = &samples[3];

    macro_rules! bench_op {
        ($new:ident, $inplace:ident) => {{
            let mut group = c.benchmark_group(stringify!($new));

            group.bench_function("new", |b| {
                b.iter(|| bitmap1.$new(bitmap2));
            });
            group.bench_function("inplace", |b| {
                b.iter_batched(
                    || bitmap1.clone(),
                    |mut dst_bitmap| dst_bitmap.$inplace(bitmap2),
                    BatchSize::SmallInput,
                );
            });

            group
        }};
        ($new:ident, $inplace:ident, $fast:ident) => {{
            let mut group = bench_op!($new, $inplace);

            group.bench_function("fast", |b| {
                b.iter(|| Bitmap::$fast(&[bitmap1, bitmap2]));
            });

            group
        }};
        ($new:ident, $inplace:ident, $fast:ident, $fast_heap:ident) => {{
            let mut group = bench_op!($new, $inplace, $fast);

            group.bench_function("fast_heap", |b| {
                b.iter(|| Bitmap::$fast_heap(&[bitmap1, bitmap2]));
            });

            group
        }};
    }

    bench_op!(and, and_inplace);
    bench_op!(or, or_inplace, fast_or, fast_or_heap);
    bench_op!(xor, xor_inplace, fast_xor);
    bench_op!(andnot, andnot_inplace);

    c.bench_function("and_cardinality", |b| {
        b.iter(|| bitmap1.and_cardinality(bitmap2))
    });
}

fn flip(c: &mut Criterion) {
    let bitmap = Bitmap::from_range_with_step(0..1_000_000, 2);

    let mut group = c.benchmark_group("flip");
    group.bench_function("new", |b| {
        b.iter(|| bitmap.flip(1_000..300_000));
    });
    group.bench_function("inplace", |b| {
        b.iter_batched(
            || bitmap.clone(),
            |mut bitmap| bitmap.flip_inplace(1_000..300_000),
            BatchSize::SmallInput,
        );
    });
}

fn iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iter");
    for (name, bitmap) in samples() {
        group.throughput(Throughput::Elements(bitmap.cardinality()));
        group.bench_function(name, |b| b.iter(|| bitmap.iter().fold(0u32, u32::wrapping_add)));
    }
    group.finish();

    let mut group = c.benchmark_group("next_many");
    for (name, bitmap) in samples() {
        group.throughput(Throughput::Elements(bitmap.cardinality()));
        group.bench_function(name, |b| {
            let mut buf = [0; 1024];
            b.iter(|| {
                let mut iter = bitmap.iter();
                while iter.next_many(&mut buf) != 0 {}
            })
        });
    }
    group.finish();
}

fn run_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_optimize");
    for (name, bitmap) in samples() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || bitmap.clone(),
                |mut bitmap| bitmap.run_optimize(),
                BatchSize::SmallInput,
            );
        });
    }
}

fn serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    for &size in &[100_000, 1_000_000] {
        let bitmap: Bitmap = (1..size).collect();
        group.throughput(Throughput::Elements(size.into()));
        group.bench_with_input(BenchmarkId::new("portable", size), &size, |b, _| {
            b.iter(|| bitmap.serialize::<Portable>());
        });
        group.bench_with_input(BenchmarkId::new("native", size), &size, |b, _| {
            b.iter(|| bitmap.serialize::<Native>());
        });
    }
}

fn deserialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize");
    for (name, bitmap) in samples() {
        let serialized_buffer = bitmap.serialize::<Portable>();
        group.throughput(Throughput::Bytes(serialized_buffer.len() as u64));
        group.bench_function(BenchmarkId::new("checked", name), |b| {
            b.iter(|| Bitmap::deserialize::<Portable>(&serialized_buffer));
        });
        group.bench_function(BenchmarkId::new("unchecked", name), |b| {
            b.iter(|| unsafe { Bitmap::try_deserialize_unchecked::<Portable>(&serialized_buffer) });
        });
    }
}

criterion_group!(
    benches,
    create,
    add,
    remove,
    queries,
    binops,
    flip,
    iterate,
    run_optimize,
    serialize,
    deserialize,
);
criterion_main!(benches);
